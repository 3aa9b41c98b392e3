use log::info;
use steadytrack::examples::BoxGen2;
use steadytrack::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut tracker = GatedSort::new(SortOptions::default().max_disappeared(3).history_length(10))?;

    let pos_drift = 3.0;
    let box_drift = 0.5;
    let mut b1 = BoxGen2::new_monotonous(100.0, 100.0, 40.0, 80.0, pos_drift, box_drift);
    let mut b2 = BoxGen2::new_monotonous(10.0, 10.0, 30.0, 60.0, pos_drift, box_drift);

    for _ in 0..20 {
        let obj1b = b1.next().unwrap();
        let obj2b = b2.next().unwrap();
        let tracks = tracker.predict(&[obj1b.into(), obj2b.into()]);
        for t in tracks {
            info!(
                "Frame {}: track {} ({:?}) at {:?}",
                t.frame, t.id, t.state, t.bbox
            );
        }
    }

    tracker.skip_frames(4);

    for t in tracker.wasted() {
        eprintln!("Track id: {}, reason: {:?}", t.id, t.reason);
        eprintln!("Boxes: {:#?}", t.predicted_boxes);
    }
    Ok(())
}
