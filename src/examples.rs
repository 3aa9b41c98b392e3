use crate::trackers::sort::Detection;
use crate::utils::bbox::BoundingBox;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Generator of a drifting box, yields a new position on every call to `next()`
///
pub struct BoxGen2 {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    gen: ThreadRng,
    dist_pos: Uniform<f32>,
    dist_box: Uniform<f32>,
}

impl BoxGen2 {
    /// The box wanders around the start position
    ///
    pub fn new(x: f32, y: f32, width: f32, height: f32, pos_drift: f32, box_drift: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new(-pos_drift, pos_drift),
            dist_box: Uniform::new(-box_drift, box_drift),
        }
    }

    /// The box moves right and down, at most `pos_drift` per step
    ///
    pub fn new_monotonous(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        pos_drift: f32,
        box_drift: f32,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new(0.0, pos_drift),
            dist_box: Uniform::new(-box_drift, box_drift),
        }
    }
}

impl Iterator for BoxGen2 {
    type Item = BoundingBox;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(self.dist_pos);
        self.y += self.gen.sample(self.dist_pos);

        self.width += self.gen.sample(self.dist_box);
        self.height += self.gen.sample(self.dist_box);

        if self.width < 1.0 {
            self.width = 1.0;
        }
        if self.height < 1.0 {
            self.height = 1.0;
        }

        Some(BoundingBox::ltwh(self.x, self.y, self.width, self.height))
    }
}

/// Detections of several generated objects for one frame, with a random confidence
///
pub fn frame_detections(objects: &mut [BoxGen2], min_confidence: f32) -> Vec<Detection> {
    let mut gen = rand::thread_rng();
    let dist_conf = Uniform::new_inclusive(min_confidence.clamp(0.0, 1.0), 1.0);
    objects
        .iter_mut()
        .filter_map(|o| o.next())
        .map(|bbox| Detection::new(bbox, gen.sample(dist_conf)))
        .collect()
}
