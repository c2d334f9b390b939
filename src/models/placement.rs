/// Axis-aligned rectangle in container pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[cfg(test)]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[cfg(test)]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// On-screen rectangle of a row's video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub row: usize,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

/// Measured size of the display container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Resolve a container size from the first usable measurement.
    ///
    /// Width tries the container allocation, then the window, then the
    /// nominal display width. Height tries the container allocation, then
    /// the nominal grid height.
    pub fn resolve(
        measured_width: f64,
        measured_height: f64,
        window_width: f64,
        nominal_width: f64,
        nominal_height: f64,
    ) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let width = [measured_width, window_width, nominal_width]
            .into_iter()
            .find(|v| usable(*v))
            .unwrap_or(0.0);
        let height = [measured_height, nominal_height]
            .into_iter()
            .find(|v| usable(*v))
            .unwrap_or(0.0);
        Self { width, height }
    }
}
