use glam::*;

use crate::MapProjection;

/// pixel size of a tile edge. used to derive how much of the world is visible at a zoom level.
pub const TILE_PIXEL_SIZE: f64 = 256.0;

/// The camera that markers are drawn with.
///
/// The view projection matrix is camera relative: the camera always sits above the local origin,
/// and everything drawn with it must subtract [View::position] from its world coordinates first.
/// Absolute mercator meters are too large to be represented by f32 matrices without visible jitter.
#[derive(Debug, Clone)]
pub struct View {
    position: DVec2,
    zoom: f32,
    width: u32,
    height: u32,
    fov: f32,
    view_projection: Mat4,
}

impl View {
    pub const DEFAULT_FOV: f32 = std::f32::consts::FRAC_PI_4;

    pub fn new(width: u32, height: u32) -> Self {
        let mut view = Self {
            position: DVec2::ZERO,
            zoom: 0.0,
            width: width.max(1),
            height: height.max(1),
            fov: Self::DEFAULT_FOV,
            view_projection: Mat4::IDENTITY,
        };
        view.update();
        view
    }
    /// For callers which manage their own camera and only need markers to follow it.
    pub fn from_parts(position: DVec2, view_projection: Mat4) -> Self {
        Self {
            position,
            zoom: 0.0,
            width: 1,
            height: 1,
            fov: Self::DEFAULT_FOV,
            view_projection,
        }
    }
    /// position of the camera in mercator meters
    pub fn position(&self) -> DVec2 {
        self.position
    }
    pub fn zoom(&self) -> f32 {
        self.zoom
    }
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection
    }
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(0.0);
    }
    pub fn set_size(&mut self, width: u32, height: u32) {
        tracing::debug!(width, height, "resizing view");
        self.width = width.max(1);
        self.height = height.max(1);
    }
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
    /// meters covered by a single pixel at the current zoom
    pub fn meters_per_pixel(&self) -> f64 {
        MapProjection::HALF_CIRCUMFERENCE * 2.0
            / 2f64.powf(self.zoom as f64)
            / TILE_PIXEL_SIZE
    }
    /// distance of the camera from the ground, so that the viewport width covers the world span at this zoom
    pub fn camera_height(&self) -> f32 {
        let visible_width = self.meters_per_pixel() * self.width as f64;
        let half_horizontal_fov = ((self.fov * 0.5).tan() * self.aspect()) as f64;
        (visible_width * 0.5 / half_horizontal_fov) as f32
    }
    /// rebuilds the view projection matrix. call this after changing zoom/size
    pub fn update(&mut self) {
        let camera_height = self.camera_height();
        let eye = vec3(0.0, 0.0, camera_height);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov,
            self.aspect(),
            camera_height * 0.01,
            camera_height * 2.0,
        );
        self.view_projection = proj * view;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0.0)]
    #[case(8.0)]
    #[case(18.0)]
    fn camera_origin_projects_to_screen_center(#[case] zoom: f32) {
        let mut view = View::new(800, 600);
        view.set_position(dvec2(1.0e7, -3.0e6));
        view.set_zoom(zoom);
        view.update();
        let clip = *view.view_projection_matrix() * vec4(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "{ndc:?}");
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[rstest]
    fn viewport_edge_maps_to_ndc_edge() {
        let mut view = View::new(512, 512);
        view.set_zoom(4.0);
        view.update();
        let half_width = (view.meters_per_pixel() * 256.0) as f32;
        let clip = *view.view_projection_matrix() * vec4(half_width, 0.0, 0.0, 1.0);
        let ndc_x = clip.x / clip.w;
        assert!((ndc_x - 1.0).abs() < 1e-3, "{ndc_x}");
    }
}
