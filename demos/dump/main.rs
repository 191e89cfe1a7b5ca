//! Z-cut dump: builds a PMT-like solid, cuts it and logs every step.
//!
//! Usage:
//! ```text
//! cargo run --example dump                 # cut at z = 0
//! cargo run --example dump -- -250         # cut at z = -250
//! RUST_LOG=zcut=debug cargo run --example dump -- -250
//! ```

use zcut::csg::{BooleanOp, CsgStore, Ellipsoid, NodeId, PolyconeStack, Tube, ZPlane};
use zcut::math::Vector3;
use zcut::operations::tree::TraversalOrder;
use zcut::operations::zcut::{ZCutOutcome, ZCutParams, ZCutter};
use zcut::volume::{LogicalVolume, PhysicalVolume, TransformTable};
use zcut::Result;

/// `((top ∪ neck) ∪ tail)`, stacked downwards from the equator at z = 0.
fn pmt(store: &mut CsgStore) -> NodeId {
    let top = store.add_primitive("pmt_top", Ellipsoid::new(254.0, 254.0, 184.0));
    let neck = store.add_primitive("pmt_neck", Tube::new(0.0, 50.0, 50.0));
    let tail = store.add_primitive(
        "pmt_tail",
        PolyconeStack::new(vec![
            ZPlane::new(0.0, 40.0, -100.0),
            ZPlane::new(0.0, 50.0, 0.0),
        ]),
    );
    let upper = store.add_boolean(
        "pmt_upper",
        BooleanOp::Union,
        top,
        neck,
        Some(Vector3::new(0.0, 0.0, -234.0)),
    );
    store.add_boolean(
        "pmt_solid",
        BooleanOp::Union,
        upper,
        tail,
        Some(Vector3::new(0.0, 0.0, -284.0)),
    )
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for zcut.
    // Override with RUST_LOG env var (e.g. RUST_LOG=zcut=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("zcut=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let z_cut = match std::env::args().nth(1).map(|a| a.parse::<f64>()) {
        None => 0.0,
        Some(Ok(z)) => z,
        Some(Err(err)) => {
            tracing::error!(%err, "cut height must be a number");
            std::process::exit(2);
        }
    };

    let mut store = CsgStore::new();
    let root = pmt(&mut store);

    let mut cutter = ZCutter::new(&store, root, ZCutParams::default())?;
    cutter.classify(z_cut)?;
    cutter.draw(TraversalOrder::Postorder)?.print();
    cutter.dump_tree()?;

    let report = cutter.cut(z_cut)?;
    tracing::info!(
        class = %report.root_class,
        straddled = ?report.straddled,
        pruned = report.pruned,
        "cut done"
    );

    match cutter.into_outcome() {
        ZCutOutcome::Excluded => tracing::info!(z_cut, "nothing above the cut"),
        ZCutOutcome::Cut(tree) => {
            let name = tree.name()?.to_owned();
            let mut after = ZCutter::new(tree.store(), tree.root(), ZCutParams::default())?;
            after.classify(z_cut)?;
            after.draw(TraversalOrder::ReversePreorder)?.print();
            after.dump_tree()?;
            after.dump_up()?;

            let pmt_log = LogicalVolume::new("pmt_log", name, "Pyrex");
            let world = LogicalVolume::new("world_log", "world_solid", "Water").with_daughter(
                PhysicalVolume::translated("pmt_phys", pmt_log, Vector3::new(0.0, 0.0, z_cut)),
            );
            TransformTable::collect(&PhysicalVolume::world(world)).dump();
        }
    }
    Ok(())
}
