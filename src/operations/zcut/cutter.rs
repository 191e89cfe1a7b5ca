use crate::csg::{CsgStore, CsgTree, NodeId};
use crate::debug::Canvas;
use crate::error::{InvariantError, Result};
use crate::operations::clone::DeepClone;
use crate::operations::tree::{FrameResolver, ParentMap, TraversalOrder, TreeIndex};

use super::apply::ApplyZCut;
use super::classify::{global_z_range, ClassificationMap, Classify, ZClass};
use super::reroot::FindCandidateRoot;
use super::{ZCutOutcome, ZCutParams};

/// What a call to [`ZCutter::cut`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct CutReport {
    /// Classification of the whole tree before cutting.
    pub root_class: ZClass,
    /// Names of the leaves that were reshaped, in postorder.
    pub straddled: Vec<String>,
    /// New root, or `None` when nothing survived.
    pub candidate: Option<NodeId>,
    /// Nodes dropped from the store by re-rooting.
    pub pruned: usize,
}

/// A z-cut session on a private copy of a tree.
///
/// The session owns the copy together with the maps derived from it. The
/// maps are rebuilt whenever the shape of the tree changes.
#[derive(Debug)]
pub struct ZCutter {
    tree: CsgTree,
    parents: ParentMap,
    index: TreeIndex,
    classes: ClassificationMap,
    params: ZCutParams,
    excluded: bool,
}

impl ZCutter {
    /// Deep-clones the tree rooted at `root` and indexes the copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the source tree cannot be cloned.
    pub fn new(source: &CsgStore, root: NodeId, params: ZCutParams) -> Result<Self> {
        let tree = DeepClone::new(root).execute(source)?;
        let parents = ParentMap::build(tree.store(), tree.root())?;
        let index = TreeIndex::build(tree.store(), tree.root())?;
        let name = tree.name()?;
        tracing::info!(
            node = %name,
            width = index.width(),
            height = index.height(),
            "z-cut session"
        );
        Ok(Self {
            tree,
            parents,
            index,
            classes: ClassificationMap::default(),
            params,
            excluded: false,
        })
    }

    fn init_tree(&mut self) -> Result<()> {
        self.parents = ParentMap::build(self.tree.store(), self.tree.root())?;
        self.index = TreeIndex::build(self.tree.store(), self.tree.root())?;
        Ok(())
    }

    /// The working tree.
    #[must_use]
    pub fn tree(&self) -> &CsgTree {
        &self.tree
    }

    /// Parent map of the working tree.
    #[must_use]
    pub fn parents(&self) -> &ParentMap {
        &self.parents
    }

    /// Traversal index of the working tree.
    #[must_use]
    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    /// Classification from the latest call to [`ZCutter::classify`] or [`ZCutter::cut`].
    #[must_use]
    pub fn classes(&self) -> &ClassificationMap {
        &self.classes
    }

    /// Parameters of this session.
    #[must_use]
    pub fn params(&self) -> &ZCutParams {
        &self.params
    }

    /// Returns `true` once a cut has removed everything.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Classifies the working tree against `z_cut` and returns the root's class.
    ///
    /// # Errors
    ///
    /// Returns an error if a leaf has a degenerate z range or a wrapper
    /// carries a rotation.
    pub fn classify(&mut self, z_cut: f64) -> Result<ZClass> {
        let root = self.tree.root();
        self.classes = Classify::new(z_cut)
            .with_tolerance(self.params.tolerance)
            .execute(self.tree.store(), root, &self.parents)?;
        Ok(self.classes.get(self.tree.store(), root)?)
    }

    /// Removes everything below `z_cut` from the working tree.
    ///
    /// Straddling leaves are reshaped to start at the cut, then the tree is
    /// re-rooted onto the first subtree in reverse preorder that lies
    /// entirely above it. When no such subtree exists the session is marked
    /// excluded and the tree is left as cut.
    ///
    /// # Errors
    ///
    /// Returns an error if a primitive cannot be cut, or if a reshaped leaf
    /// still straddles the plane afterwards.
    pub fn cut(&mut self, z_cut: f64) -> Result<CutReport> {
        let root_class = self.classify(z_cut)?;
        tracing::info!(z_cut, class = %root_class, "cutting tree");

        let cuts = self.straddling_cuts(z_cut)?;
        for &(position, local_z_cut) in &cuts {
            ApplyZCut::new(position, local_z_cut).execute(self.tree.store_mut())?;
        }

        self.classify(z_cut)?;
        let mut straddled = Vec::with_capacity(cuts.len());
        for &(position, _) in &cuts {
            let name = self.tree.store().resolved(position)?.name.clone();
            let class = self.classes.get(self.tree.store(), position)?;
            if class != ZClass::INCLUDE {
                return Err(InvariantError::CutDidNotConverge { node: name, z_cut }.into());
            }
            straddled.push(name);
        }

        if self.params.draw {
            let canvas = self.draw(self.params.draw_order)?;
            tracing::debug!("\n{canvas}");
        }

        let candidate = FindCandidateRoot::new(&self.index, &self.classes).execute(self.tree.store())?;
        let mut pruned = 0;
        match candidate {
            None => {
                self.excluded = true;
                tracing::info!(z_cut, "tree entirely below cut");
            }
            Some(new_root) if new_root == self.tree.root() => {}
            Some(new_root) => {
                self.tree.set_root(new_root);
                pruned = self.tree.store_mut().retain_reachable(new_root)?;
                self.init_tree()?;
                self.classify(z_cut)?;
                let name = self.tree.name()?;
                tracing::info!(
                    node = %name,
                    pruned,
                    width = self.index.width(),
                    "re-rooted tree"
                );
            }
        }

        Ok(CutReport {
            root_class,
            straddled,
            candidate,
            pruned,
        })
    }

    /// Straddling leaves in postorder with their cut heights in local frame.
    ///
    /// All heights are resolved before any leaf is edited.
    fn straddling_cuts(&self, z_cut: f64) -> Result<Vec<(NodeId, f64)>> {
        let store = self.tree.store();
        let frame = FrameResolver::new(store, &self.parents);
        let mut cuts = Vec::new();
        for &position in self.index.sequence(TraversalOrder::Postorder) {
            if store.children(position)?.is_some() {
                continue;
            }
            if self.classes.get(store, position)? == ZClass::STRADDLE {
                let z_delta = frame.global_z_offset(position)?;
                let name = &store.resolved(position)?.name;
                tracing::debug!(
                    node = %name,
                    z_delta,
                    local_z_cut = z_cut - z_delta,
                    "straddling leaf"
                );
                cuts.push((position, z_cut - z_delta));
            }
        }
        Ok(cuts)
    }

    /// Consumes the session, returning the cut tree or [`ZCutOutcome::Excluded`].
    #[must_use]
    pub fn into_outcome(self) -> ZCutOutcome {
        if self.excluded {
            ZCutOutcome::Excluded
        } else {
            ZCutOutcome::Cut(self.tree)
        }
    }

    /// Renders the working tree, one cell per position.
    ///
    /// Columns are inorder ranks and levels depths. Each cell shows the
    /// node's kind tag, its class mask and its rank in `order`.
    ///
    /// # Errors
    ///
    /// Returns an error if an indexed node is missing from the store.
    pub fn draw(&self, order: TraversalOrder) -> Result<Canvas> {
        let store = self.tree.store();
        let mut canvas = Canvas::new(self.index.width(), self.index.height() + 1);
        for (x, &position) in self.index.sequence(TraversalOrder::Inorder).iter().enumerate() {
            let y = self.index.depth(position).unwrap_or_default();
            canvas.draw(x, y, store.node(position)?.tag(), 0);
            canvas.draw(x, y, self.classes.get(store, position)?, 1);
            if let Some(rank) = self.index.rank(order, position) {
                canvas.draw(x, y, rank, 2);
            }
        }
        Ok(canvas)
    }

    /// Logs every position in preorder with its frame and, for leaves, its z ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing or a frame cannot be resolved.
    pub fn dump_tree(&self) -> Result<()> {
        let store = self.tree.store();
        let frame = FrameResolver::new(store, &self.parents);
        for &position in self.index.sequence(TraversalOrder::Preorder) {
            let node = store.resolved(position)?;
            let depth = self.index.depth(position).unwrap_or_default();
            let local = frame.local_translation(position)?;
            let z_delta = frame.global_z_offset(position)?;
            if store.children(position)?.is_some() {
                tracing::info!(
                    kind = node.type_name(),
                    node = %node.name,
                    depth,
                    z_delta,
                    tz = local.z,
                    "dump boolean"
                );
            } else {
                let (z0, z1) = store.primitive(position)?.local_z_range(&node.name)?;
                let (az0, az1) = global_z_range(store, &self.parents, position)?;
                tracing::info!(
                    kind = node.type_name(),
                    node = %node.name,
                    depth,
                    z_delta,
                    tx = local.x,
                    ty = local.y,
                    tz = local.z,
                    z0,
                    z1,
                    az0,
                    az1,
                    "dump leaf"
                );
            }
        }
        Ok(())
    }

    /// Logs the accumulated translation of every leaf, walking up from each.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing or a frame cannot be resolved.
    pub fn dump_up(&self) -> Result<()> {
        let store = self.tree.store();
        let frame = FrameResolver::new(store, &self.parents);
        for &position in self.index.sequence(TraversalOrder::Postorder) {
            if store.children(position)?.is_some() {
                continue;
            }
            let node = store.resolved(position)?;
            let t = frame.global_translation(position)?;
            tracing::info!(
                kind = node.type_name(),
                node = %node.name,
                tx = t.x,
                ty = t.y,
                tz = t.z,
                "dump up"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::csg::{BooleanOp, Ellipsoid, PolyconeStack, Primitive, Tube, ZPlane};
    use crate::error::ZCutError;
    use crate::math::Vector3;
    use crate::operations::zcut::ZCut;
    use approx::assert_relative_eq;

    /// `sub = Ellipsoid[-3, 3] - Tube(hz=2)`, undisplaced.
    fn cathode(store: &mut CsgStore) -> NodeId {
        let ell = store.add_primitive("ell", Ellipsoid::new(5.0, 5.0, 3.0));
        let inner = store.add_primitive("inner", Tube::new(0.0, 1.0, 2.0));
        store.add_boolean("sub", BooleanOp::Subtraction, ell, inner, None)
    }

    /// `Union(Tube(hz=10), sub)` with the tube as left operand.
    fn tube_left(store: &mut CsgStore) -> NodeId {
        let outer = store.add_primitive("outer", Tube::new(0.0, 5.0, 10.0));
        let sub = cathode(store);
        store.add_boolean("pmt", BooleanOp::Union, outer, sub, None)
    }

    /// `Union(sub, Tube(hz=10))` with the tube as displaced right operand.
    fn tube_right(store: &mut CsgStore) -> NodeId {
        let sub = cathode(store);
        let outer = store.add_primitive("outer", Tube::new(0.0, 5.0, 10.0));
        store.add_boolean("pmt", BooleanOp::Union, sub, outer, Some(Vector3::zeros()))
    }

    fn position_of(cutter: &ZCutter, name: &str) -> NodeId {
        let store = cutter.tree().store();
        cutter
            .index()
            .sequence(TraversalOrder::Preorder)
            .iter()
            .copied()
            .find(|&p| store.resolved(p).unwrap().name == name)
            .unwrap()
    }

    fn class_of(cutter: &ZCutter, name: &str) -> ZClass {
        let position = position_of(cutter, name);
        cutter.classes().get(cutter.tree().store(), position).unwrap()
    }

    fn range_of(cutter: &ZCutter, name: &str) -> (f64, f64) {
        let position = position_of(cutter, name);
        global_z_range(cutter.tree().store(), cutter.parents(), position).unwrap()
    }

    fn quiet() -> ZCutParams {
        ZCutParams {
            draw: false,
            ..ZCutParams::default()
        }
    }

    #[test]
    fn left_tube_straddles_and_cannot_be_cut() {
        let mut store = CsgStore::new();
        let root = tube_left(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();

        let class = cutter.classify(4.0).unwrap();
        assert_eq!(class, ZClass::STRADDLE | ZClass::EXCLUDE);
        assert_eq!(class_of(&cutter, "outer"), ZClass::STRADDLE);
        assert_eq!(class_of(&cutter, "sub"), ZClass::EXCLUDE);

        let err = cutter.cut(4.0).unwrap_err();
        assert!(matches!(
            err,
            ZCutError::Invariant(InvariantError::MissingDisplacement { ref node }) if node == "outer"
        ));
    }

    #[test]
    fn right_tube_is_cut_and_becomes_root() {
        let mut store = CsgStore::new();
        let root = tube_right(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();

        let report = cutter.cut(4.0).unwrap();
        assert_eq!(report.root_class, ZClass::STRADDLE | ZClass::EXCLUDE);
        assert_eq!(report.straddled, vec!["outer".to_owned()]);
        // ell, inner and its clone-time wrapper, sub, root
        assert_eq!(report.pruned, 5);
        assert_eq!(cutter.index().width(), 1);

        let tree = cutter.tree();
        assert_eq!(tree.name().unwrap(), "outer");
        assert!(tree.store().node(tree.root()).unwrap().is_displaced());
        let (az0, az1) = global_z_range(tree.store(), cutter.parents(), tree.root()).unwrap();
        assert_relative_eq!(az0, 4.0);
        assert_relative_eq!(az1, 10.0);

        let outcome = cutter.into_outcome();
        assert!(!outcome.is_excluded());
        assert_eq!(outcome.tree().unwrap().store().len(), 2);
    }

    #[test]
    fn bare_right_tube_is_cut() {
        let mut store = CsgStore::new();
        let root = cathode(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();

        let report = cutter.cut(0.0).unwrap();
        assert_eq!(report.straddled, vec!["ell".to_owned(), "inner".to_owned()]);
        assert_eq!(cutter.tree().name().unwrap(), "sub");

        let (az0, az1) = range_of(&cutter, "inner");
        assert_relative_eq!(az0, 0.0);
        assert_relative_eq!(az1, 2.0);
        let (az0, az1) = range_of(&cutter, "ell");
        assert_relative_eq!(az0, 0.0);
        assert_relative_eq!(az1, 3.0);
    }

    /// `pmt = base ∪ (core @ +10)` with `core = cone ∪ (tube @ -3)`.
    ///
    /// Global ranges: base [-2, 2], cone [8, 12], tube [3, 11].
    fn nested(store: &mut CsgStore) -> NodeId {
        let base = store.add_primitive("base", Ellipsoid::new(2.0, 2.0, 2.0));
        let cone = store.add_primitive(
            "cone",
            PolyconeStack::new(vec![ZPlane::new(0.0, 1.0, -2.0), ZPlane::new(0.0, 2.0, 2.0)]),
        );
        let tube = store.add_primitive("tube", Tube::new(0.0, 1.0, 4.0));
        let core = store.add_boolean(
            "core",
            BooleanOp::Union,
            cone,
            tube,
            Some(Vector3::new(0.0, 0.0, -3.0)),
        );
        store.add_boolean(
            "pmt",
            BooleanOp::Union,
            base,
            core,
            Some(Vector3::new(0.0, 0.0, 10.0)),
        )
    }

    #[test]
    fn nested_offsets_cut_every_straddling_leaf() {
        let mut store = CsgStore::new();
        let root = nested(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();

        let report = cutter.cut(9.0).unwrap();
        assert_eq!(report.root_class, ZClass::STRADDLE | ZClass::EXCLUDE);
        assert_eq!(report.straddled, vec!["cone".to_owned(), "tube".to_owned()]);

        // base and the top union are dropped, core keeps its +10 wrapper
        assert_eq!(report.pruned, 2);
        let tree = cutter.tree();
        assert_eq!(tree.name().unwrap(), "core");
        assert!(tree.store().node(tree.root()).unwrap().is_displaced());
        assert_eq!(cutter.classes().get(tree.store(), tree.root()).unwrap(), ZClass::INCLUDE);

        let (az0, az1) = range_of(&cutter, "cone");
        assert_relative_eq!(az0, 9.0);
        assert_relative_eq!(az1, 12.0);
        let (az0, az1) = range_of(&cutter, "tube");
        assert_relative_eq!(az0, 9.0);
        assert_relative_eq!(az1, 11.0);

        let Primitive::Tube(tube) = tree.store().primitive(position_of(&cutter, "tube")).unwrap() else {
            panic!("expected tube");
        };
        assert_relative_eq!(tube.half_z, 1.0);
    }

    #[test]
    fn source_tree_is_never_modified() {
        let mut store = CsgStore::new();
        let root = tube_right(&mut store);
        let before = store.len();
        ZCut::new(root, 4.0).with_params(quiet()).execute(&store).unwrap();

        assert_eq!(store.len(), before);
        let outer = store
            .reachable(root)
            .unwrap()
            .into_iter()
            .find(|&id| store.node(id).unwrap().name == "outer")
            .unwrap();
        let Primitive::Tube(tube) = store.primitive(outer).unwrap() else {
            panic!("expected tube");
        };
        assert_relative_eq!(tube.half_z, 10.0);
    }

    #[test]
    fn cut_above_everything_is_excluded() {
        let mut store = CsgStore::new();
        let root = tube_right(&mut store);
        let outcome = ZCut::new(root, 20.0).with_params(quiet()).execute(&store).unwrap();
        assert!(outcome.is_excluded());
        assert!(outcome.into_tree().is_none());
    }

    #[test]
    fn cut_below_everything_keeps_whole_tree() {
        let mut store = CsgStore::new();
        let root = tube_left(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();
        let report = cutter.cut(-20.0).unwrap();

        assert_eq!(report.root_class, ZClass::INCLUDE);
        assert!(report.straddled.is_empty());
        assert_eq!(report.pruned, 0);
        assert_eq!(cutter.tree().name().unwrap(), "pmt");
        // the clone wraps the bare right operands `inner` and `sub`
        assert_eq!(cutter.tree().store().len(), store.len() + 2);
    }

    #[test]
    fn ellipsoid_cut_converges() {
        let mut store = CsgStore::new();
        let base = store.add_primitive("base", Tube::new(0.0, 1.0, 1.0));
        let ell = store.add_primitive("cap", Ellipsoid::new(4.0, 4.0, 5.0));
        let root = store.add_boolean(
            "pmt",
            BooleanOp::Union,
            base,
            ell,
            Some(Vector3::new(0.0, 0.0, 6.0)),
        );
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();
        let report = cutter.cut(7.0).unwrap();

        assert_eq!(report.straddled, vec!["cap".to_owned()]);
        assert_eq!(cutter.tree().name().unwrap(), "cap");
        let Primitive::Ellipsoid(cap) = cutter.tree().store().primitive(cutter.tree().root()).unwrap()
        else {
            panic!("expected ellipsoid");
        };
        assert_relative_eq!(cap.z_bottom_cut, 1.0);
        assert_relative_eq!(cap.z_top_cut, 5.0);
    }

    #[test]
    fn clone_then_classify_matches_source() {
        let mut store = CsgStore::new();
        let root = tube_right(&mut store);
        let parents = ParentMap::build(&store, root).unwrap();
        let index = TreeIndex::build(&store, root).unwrap();
        let source = Classify::new(1.0).execute(&store, root, &parents).unwrap();

        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();
        cutter.classify(1.0).unwrap();

        for &position in index.sequence(TraversalOrder::Preorder) {
            let name = &store.resolved(position).unwrap().name;
            assert_eq!(source.get(&store, position).unwrap(), class_of(&cutter, name));
        }
    }

    #[test]
    fn classes_are_exclusive_on_leaves_and_or_on_booleans() {
        let mut store = CsgStore::new();
        let root = tube_right(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();

        for z_cut in [-12.0, -2.5, 0.0, 2.0, 3.0, 9.0, 12.0] {
            cutter.classify(z_cut).unwrap();
            let store = cutter.tree().store();
            for &position in cutter.index().sequence(TraversalOrder::Postorder) {
                let class = cutter.classes().get(store, position).unwrap();
                match store.children(position).unwrap() {
                    Some((left, right)) => {
                        let expected = cutter.classes().get(store, left).unwrap()
                            | cutter.classes().get(store, right).unwrap();
                        assert_eq!(class, expected);
                    }
                    None => assert!(
                        [ZClass::INCLUDE, ZClass::STRADDLE, ZClass::EXCLUDE].contains(&class),
                        "leaf class {class} at z_cut {z_cut}"
                    ),
                }
            }
        }
    }

    #[test]
    fn draw_places_root_at_its_inorder_column() {
        let mut store = CsgStore::new();
        let root = tube_left(&mut store);
        let mut cutter = ZCutter::new(&store, root, quiet()).unwrap();
        cutter.classify(4.0).unwrap();

        let canvas = cutter.draw(TraversalOrder::ReversePreorder).unwrap();
        assert_eq!(canvas.columns(), 5);
        assert_eq!(canvas.levels(), 3);
        let text = canvas.to_string();
        let lines: Vec<&str> = text.lines().collect();
        // inorder: outer, pmt, ell, sub, inner
        assert_eq!(lines[0].trim(), "Uni");
        assert_eq!(lines[1].trim(), "SE");
        assert_eq!(lines[2].trim(), "0");
        assert!(lines[4].starts_with("Tub"));
    }
}
