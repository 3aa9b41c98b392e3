use crate::{EstimateClose, EPS};

/// Bounding box in the corner format (x_min, y_min, x_max, y_max)
///
#[derive(Clone, Default, Debug, Copy, PartialEq)]
pub struct BoundingBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl BoundingBox {
    /// Constructor
    ///
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Constructor from the top-left corner and the size
    ///
    pub fn ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn x_min(&self) -> f32 {
        self.x_min
    }

    pub fn y_min(&self) -> f32 {
        self.y_min
    }

    pub fn x_max(&self) -> f32 {
        self.x_max
    }

    pub fn y_max(&self) -> f32 {
        self.y_max
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// The box has finite coordinates and strictly positive width and height
    ///
    pub fn is_valid(&self) -> bool {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn as_scale_aspect(&self) -> ScaleAspectBox {
        ScaleAspectBox::from(self)
    }

    /// Area of the overlapping region, `0.0` for disjoint boxes
    ///
    pub fn intersection(l: &BoundingBox, r: &BoundingBox) -> f32 {
        let int_width = l.x_max.min(r.x_max) - l.x_min.max(r.x_min);
        let int_height = l.y_max.min(r.y_max) - l.y_min.max(r.y_min);

        if int_width > 0.0 && int_height > 0.0 {
            int_width * int_height
        } else {
            0.0
        }
    }

    /// Intersection over union, lays in `[0.0, 1.0]`
    ///
    pub fn iou(l: &BoundingBox, r: &BoundingBox) -> f32 {
        let intersection = Self::intersection(l, r);
        let union = l.area() + r.area() - intersection;
        if union > 0.0 && union.is_finite() {
            (intersection / union).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Euclidean distance between box centers
    ///
    pub fn center_distance(l: &BoundingBox, r: &BoundingBox) -> f32 {
        let (lx, ly) = l.center();
        let (rx, ry) = r.center();
        ((lx - rx).powi(2) + (ly - ry).powi(2)).sqrt()
    }
}

impl EstimateClose for BoundingBox {
    /// Allows comparing bboxes
    ///
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self.x_min - other.x_min).abs() < eps
            && (self.y_min - other.y_min).abs() < eps
            && (self.x_max - other.x_max).abs() < eps
            && (self.y_max - other.y_max).abs() < eps
    }
}

/// Bounding box in the measurement format of the motion estimator: center, scale (area)
/// and aspect ratio (width / height)
///
#[derive(Clone, Default, Debug, Copy, PartialEq)]
pub struct ScaleAspectBox {
    pub xc: f32,
    pub yc: f32,
    pub scale: f32,
    pub aspect: f32,
}

impl ScaleAspectBox {
    pub fn new(xc: f32, yc: f32, scale: f32, aspect: f32) -> Self {
        Self {
            xc,
            yc,
            scale,
            aspect,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.xc, self.yc, self.scale, self.aspect]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn width(&self) -> f32 {
        (self.scale * self.aspect).max(0.0).sqrt()
    }

    pub fn height(&self) -> f32 {
        let width = self.width();
        if width > 0.0 {
            self.scale / width
        } else {
            0.0
        }
    }
}

impl EstimateClose for ScaleAspectBox {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self.xc - other.xc).abs() < eps
            && (self.yc - other.yc).abs() < eps
            && (self.scale - other.scale).abs() < eps
            && (self.aspect - other.aspect).abs() < eps
    }
}

impl From<&BoundingBox> for ScaleAspectBox {
    fn from(b: &BoundingBox) -> Self {
        let (xc, yc) = b.center();
        let (width, height) = (b.width(), b.height());
        ScaleAspectBox {
            xc,
            yc,
            scale: width * height,
            aspect: if height.abs() > EPS {
                width / height
            } else {
                0.0
            },
        }
    }
}

impl From<BoundingBox> for ScaleAspectBox {
    fn from(b: BoundingBox) -> Self {
        ScaleAspectBox::from(&b)
    }
}

impl From<&ScaleAspectBox> for BoundingBox {
    fn from(b: &ScaleAspectBox) -> Self {
        let (width, height) = (b.width(), b.height());
        BoundingBox {
            x_min: b.xc - width / 2.0,
            y_min: b.yc - height / 2.0,
            x_max: b.xc + width / 2.0,
            y_max: b.yc + height / 2.0,
        }
    }
}

impl From<ScaleAspectBox> for BoundingBox {
    fn from(b: ScaleAspectBox) -> Self {
        BoundingBox::from(&b)
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::bbox::{BoundingBox, ScaleAspectBox};
    use crate::{EstimateClose, EPS};

    #[test]
    fn geometry() {
        let bb = BoundingBox::new(10.0, 10.0, 50.0, 30.0);
        assert_eq!(bb.width(), 40.0);
        assert_eq!(bb.height(), 20.0);
        assert_eq!(bb.area(), 800.0);
        assert_eq!(bb.center(), (30.0, 20.0));
        assert!(bb.is_valid());

        assert_eq!(BoundingBox::ltwh(10.0, 10.0, 40.0, 20.0), bb);
    }

    #[test]
    fn invalid_boxes() {
        assert!(!BoundingBox::new(10.0, 10.0, 10.0, 30.0).is_valid());
        assert!(!BoundingBox::new(10.0, 10.0, 20.0, 5.0).is_valid());
        assert!(!BoundingBox::new(f32::NAN, 10.0, 20.0, 30.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f32::INFINITY, 30.0).is_valid());
    }

    #[test]
    fn iou() {
        let bb1 = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        let bb2 = BoundingBox::new(12.0, 11.0, 52.0, 49.0);
        let iou = BoundingBox::iou(&bb1, &bb2);
        assert!((iou - 1444.0 / 1676.0).abs() < EPS);

        assert!((BoundingBox::iou(&bb1, &bb1) - 1.0).abs() < EPS);

        let far = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
        assert_eq!(BoundingBox::iou(&bb1, &far), 0.0);
        assert_eq!(BoundingBox::intersection(&bb1, &far), 0.0);

        let touching = BoundingBox::new(50.0, 10.0, 90.0, 50.0);
        assert_eq!(BoundingBox::iou(&bb1, &touching), 0.0);
    }

    #[test]
    fn center_distance() {
        let bb1 = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let bb2 = BoundingBox::new(3.0, 4.0, 5.0, 6.0);
        assert!((BoundingBox::center_distance(&bb1, &bb2) - 5.0).abs() < EPS);
    }

    #[test]
    fn scale_aspect_conversion() {
        let bb = BoundingBox::new(10.0, 20.0, 50.0, 100.0);
        let sa = bb.as_scale_aspect();
        assert!(sa.almost_same(&ScaleAspectBox::new(30.0, 60.0, 3200.0, 0.5), EPS));

        let back = BoundingBox::from(&sa);
        assert!(back.almost_same(&bb, 0.001));
    }

    #[test]
    fn degenerate_scale_aspect() {
        let sa = ScaleAspectBox::new(10.0, 10.0, 0.0, 1.0);
        assert_eq!(sa.width(), 0.0);
        assert_eq!(sa.height(), 0.0);

        let flat = BoundingBox::new(0.0, 0.0, 10.0, 0.0).as_scale_aspect();
        assert_eq!(flat.aspect, 0.0);
    }
}
