//! The bezel component: resolves artwork for the loaded title, lays it out
//! for the current zoom and composites the live display into its window.
//!
//! ```text
//!   +--------------------------------------+
//!   |                                      |
//!   |      +---------------+               |
//!   |      |    window     |               |
//!   |      |  live * zoom  |               | size.h * zoom
//!   |      +---------------+               |
//!   |                                      |
//!   +--------------------------------------+
//!                 size.w * zoom
//! ```

use anyhow::Context;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::catalog::{Candidate, CandidateNames, Catalog, read_sidecar};
use crate::config::Configuration;
use crate::error::{BezelError, SurfaceError};
use crate::geometry::{BezelInfo, Rect, Size};
use crate::processing::artwork::{decode_artwork, flatten_over_black, resize_rgba};
use crate::processing::blend::{BlendMask, BorderProfile};
use crate::processing::layout::nearest;
use crate::processing::window::detect_window;
use crate::surface::{Presentation, SurfaceHandle};

/// Zoom-dependent state built by [`Bezel::apply`] and read by [`Bezel::render`].
#[derive(Debug)]
struct FrameLayout {
    artwork_rect: Rect,
    live_rect: Rect,
    artwork: RgbaImage,
    mask: BlendMask,
    output: SurfaceHandle,
}

/// Bezel bound to one presentation context.
///
/// Holds the resolved [`BezelInfo`] and owns the artwork surface. It borrows
/// the presentation context for its whole life and cannot be cloned.
#[derive(Debug)]
pub struct Bezel<'a, P: Presentation + ?Sized> {
    presentation: &'a P,
    cfg: Configuration,
    catalog: Catalog,
    profile: BorderProfile,
    info: BezelInfo,
    surface: Option<SurfaceHandle>,
    layout: Option<FrameLayout>,
}

impl<'a, P: Presentation + ?Sized> Bezel<'a, P> {
    pub fn new(presentation: &'a P, cfg: Configuration) -> Self {
        Self {
            presentation,
            catalog: Catalog::from_config(&cfg),
            profile: cfg.blend.profile(),
            cfg,
            info: BezelInfo::default(),
            surface: None,
            layout: None,
        }
    }

    pub fn info(&self) -> &BezelInfo {
        &self.info
    }

    pub fn is_shown(&self) -> bool {
        self.info.is_shown()
    }

    pub fn size(&self) -> Size {
        self.info.size()
    }

    pub fn window(&self) -> Rect {
        self.info.window()
    }

    /// Artwork width over window width.
    pub fn ratio_w(&self) -> f64 {
        self.info.ratio_w()
    }

    /// Artwork height over window height.
    pub fn ratio_h(&self) -> f64 {
        self.info.ratio_h()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Feather thickness of the window border; see [`BorderProfile::border_size`].
    pub fn border_size(&self, x: u32, y: u32, size: u32, step: i32) -> u32 {
        self.profile.border_size(x, y, size, step)
    }

    /// Artwork surface at its native size.
    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }

    /// Composited output, refreshed by every [`Self::render`].
    pub fn output(&self) -> Option<&SurfaceHandle> {
        self.layout.as_ref().map(|l| &l.output)
    }

    /// Where the live display lands inside the output, after [`Self::apply`].
    pub fn live_rect(&self) -> Option<Rect> {
        self.layout.as_ref().map(|l| l.live_rect)
    }

    /// Output extent of the scaled artwork, after [`Self::apply`].
    pub fn artwork_rect(&self) -> Option<Rect> {
        self.layout.as_ref().map(|l| l.artwork_rect)
    }

    /// Resolve and load the bezel for the current content.
    ///
    /// Returns `false` and leaves the bezel hidden when nothing usable is
    /// found. Prior state is always replaced.
    pub fn load(&mut self) -> bool {
        match self.try_load() {
            Ok(candidate) => {
                info!(
                    name = %candidate.name,
                    path = %candidate.path.display(),
                    size = %self.info.size(),
                    window = %self.info.window(),
                    "bezel loaded"
                );
                true
            }
            Err(BezelError::ResolutionExhausted { .. }) => {
                info!(content = %self.presentation.content().name, "no bezel for content");
                false
            }
            Err(err) => {
                warn!(error = %err, "bezel disabled");
                false
            }
        }
    }

    /// [`Self::load`] with the failure reason.
    ///
    /// # Errors
    /// [`BezelError::SurfaceAllocation`] when the host refuses the artwork
    /// surface, otherwise [`BezelError::ResolutionExhausted`] carrying the
    /// failure of the last candidate that was tried, if any.
    pub fn try_load(&mut self) -> Result<Candidate, BezelError> {
        self.reset();
        if !self.cfg.show {
            debug!("bezels disabled in configuration");
            return Err(BezelError::ResolutionExhausted { last: None });
        }

        let names = CandidateNames::new(&self.presentation.content(), &self.cfg.default_name);
        let mut index = 0;
        let mut last_err = None;
        while let Some(candidate) = self.catalog.get_name(&names, &mut index) {
            match self.prepare(&candidate) {
                Ok((info, surface)) => {
                    self.info = info;
                    self.surface = Some(surface);
                    return Ok(candidate);
                }
                Err(err @ BezelError::SurfaceAllocation(_)) => return Err(err),
                Err(err) => {
                    warn!(name = %candidate.name, error = %err, "skipping bezel candidate");
                    last_err = Some(err);
                }
            }
        }
        Err(BezelError::ResolutionExhausted {
            last: last_err.map(Box::new),
        })
    }

    fn prepare(&self, candidate: &Candidate) -> Result<(BezelInfo, SurfaceHandle), BezelError> {
        let image = decode_artwork(&candidate.path)?;
        let size = Size::new(image.width(), image.height());

        let window = match read_sidecar(candidate)? {
            Some(window) => window,
            None => match self.cfg.window.manual {
                Some(window) => window,
                None => detect_window(
                    &image,
                    self.cfg.window.detection,
                    self.cfg.window.transparent_alpha,
                )
                .ok_or(BezelError::InvalidWindowGeometry { size, window: None })?,
            },
        };
        let info = BezelInfo::new(size, window)?;

        let surface = self.allocate(size)?;
        {
            let mut s = surface.lock();
            s.image_mut().copy_from_slice(image.as_raw());
            s.set_dst(Rect::from_size(size));
        }
        Ok((info, surface))
    }

    // Host surfaces must match the request exactly; pixels are copied in whole.
    fn allocate(&self, size: Size) -> Result<SurfaceHandle, SurfaceError> {
        let surface = self.presentation.allocate_surface(size.w, size.h)?;
        let actual = surface.size();
        if actual != size {
            return Err(SurfaceError::SizeMismatch {
                requested: size,
                actual,
            });
        }
        Ok(surface)
    }

    fn reset(&mut self) {
        self.hide_output();
        if let Some(surface) = self.surface.take() {
            surface.lock().set_visible(false);
        }
        self.info = BezelInfo::default();
    }

    fn hide_output(&mut self) {
        if let Some(layout) = self.layout.take() {
            layout.output.lock().set_visible(false);
        }
    }

    /// Lay the bezel out for the presentation's current zoom.
    ///
    /// Scales the artwork, builds the border blend mask and allocates the
    /// output surface so that [`Self::render`] does not allocate. Does
    /// nothing but hide the output when no bezel is shown.
    pub fn apply(&mut self) {
        self.hide_output();
        if !self.is_shown() {
            return;
        }
        let Some(surface) = self.surface.clone() else {
            return;
        };

        let mut zoom = self.presentation.zoom();
        if !(zoom.is_finite() && zoom > 0.0) {
            warn!(zoom, "invalid zoom; using 1.0");
            zoom = 1.0;
        }

        match self.build_layout(&surface, zoom) {
            Ok(layout) => {
                debug!(
                    zoom,
                    artwork = %layout.artwork_rect,
                    live = %layout.live_rect,
                    "bezel applied"
                );
                let mut s = surface.lock();
                s.set_dst(layout.artwork_rect);
                s.set_visible(true);
                drop(s);
                self.layout = Some(layout);
            }
            Err(err) => warn!(error = %format!("{err:#}"), "bezel layout failed; not shown"),
        }
    }

    fn build_layout(&self, surface: &SurfaceHandle, zoom: f64) -> anyhow::Result<FrameLayout> {
        let artwork_rect = Rect::from_size(self.info.size().scaled(zoom));
        let mut live_rect = self.info.window().scaled(zoom);
        live_rect.w = live_rect.w.min(artwork_rect.w.saturating_sub(live_rect.x));
        live_rect.h = live_rect.h.min(artwork_rect.h.saturating_sub(live_rect.y));
        anyhow::ensure!(
            !artwork_rect.is_empty() && !live_rect.is_empty(),
            "zoom {zoom} leaves nothing to draw"
        );

        // The host bounds the output size, and everything below is no larger.
        let output = self
            .allocate(artwork_rect.size())
            .context("output surface")?;

        let mut artwork = {
            let s = surface.lock();
            resize_rgba(s.image(), artwork_rect.w, artwork_rect.h)?
        };
        flatten_over_black(&mut artwork);

        let step = match self.cfg.blend.step {
            s if s <= 0 => 0,
            s => (f64::from(s) * zoom).round().clamp(1.0, f64::from(i32::MAX)) as i32,
        };
        let mask = BlendMask::build(live_rect.w, live_rect.h, &self.profile, step);

        {
            let mut out = output.lock();
            out.image_mut().copy_from_slice(artwork.as_raw());
            out.set_dst(artwork_rect);
            out.set_visible(true);
        }

        Ok(FrameLayout {
            artwork_rect,
            live_rect,
            artwork,
            mask,
            output,
        })
    }

    /// Composite one frame of `live` into the output surface.
    ///
    /// The live frame is scaled nearest-neighbour into the window and blended
    /// over the artwork with the border mask. Does not allocate. Does nothing
    /// before a successful [`Self::apply`].
    pub fn render(&self, live: &RgbaImage) {
        let Some(layout) = &self.layout else {
            return;
        };
        let mut out = layout.output.lock();
        let img = out.image_mut();
        img.copy_from_slice(layout.artwork.as_raw());

        let (src_w, src_h) = live.dimensions();
        if src_w == 0 || src_h == 0 {
            return;
        }
        let lr = layout.live_rect;
        for y in 0..lr.h {
            let sy = nearest(y, src_h, lr.h);
            for x in 0..lr.w {
                let a = u32::from(layout.mask.alpha(x, y));
                if a == 0 {
                    continue;
                }
                let src = live.get_pixel(nearest(x, src_w, lr.w), sy);
                let dst = img.get_pixel_mut(lr.x + x, lr.y + y);
                for c in 0..3 {
                    let blended = u32::from(src[c]) * a + u32::from(dst[c]) * (255 - a);
                    dst[c] = ((blended + 127) / 255) as u8;
                }
                dst[3] = u8::MAX;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{ContentIdentity, Session};
    use image::Rgba;
    use std::path::Path;

    fn write_frame(dir: &Path, name: &str, size: Size, hole: Rect) {
        let img = RgbaImage::from_fn(size.w, size.h, |x, y| {
            if hole.contains(x, y) {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([200, 40, 40, 255])
            }
        });
        img.save(dir.join(format!("{name}.png"))).unwrap();
    }

    fn config(dir: &Path) -> Configuration {
        Configuration {
            bezel_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn apply_and_render_before_load_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(ContentIdentity::new("Nothing"));
        let mut bezel = Bezel::new(&session, config(dir.path()));
        bezel.apply();
        bezel.render(&RgbaImage::new(4, 4));
        assert!(!bezel.is_shown());
        assert!(bezel.output().is_none());
        assert!(bezel.live_rect().is_none());
    }

    #[test]
    fn disabled_bezels_never_load() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "pitfall", Size::new(40, 30), Rect::new(5, 5, 30, 20));
        let session = Session::new(ContentIdentity::new("Pitfall!"));
        let cfg = Configuration {
            show: false,
            ..config(dir.path())
        };
        let mut bezel = Bezel::new(&session, cfg);
        assert!(!bezel.load());
        assert!(!bezel.is_shown());
    }

    #[test]
    fn loads_auto_named_artwork_and_detects_window() {
        let dir = tempfile::tempdir().unwrap();
        let hole = Rect::new(10, 8, 60, 44);
        write_frame(dir.path(), "pitfall", Size::new(80, 60), hole);
        let session = Session::new(ContentIdentity::new("Pitfall!"));
        let mut bezel = Bezel::new(&session, config(dir.path()));

        assert!(bezel.load());
        assert!(bezel.is_shown());
        assert_eq!(bezel.size(), Size::new(80, 60));
        assert_eq!(bezel.window(), hole);
        assert_eq!(bezel.surface().unwrap().size(), Size::new(80, 60));
    }

    #[test]
    fn manual_window_applies_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "combat", Size::new(50, 50), Rect::new(5, 5, 40, 40));
        let session = Session::new(ContentIdentity::new("Combat"));
        let mut cfg = config(dir.path());
        cfg.window.manual = Some(Rect::new(10, 10, 30, 30));
        let mut bezel = Bezel::new(&session, cfg);
        assert!(bezel.load());
        assert_eq!(bezel.window(), Rect::new(10, 10, 30, 30));
    }

    #[test]
    fn window_outside_artwork_degrades_to_no_bezel() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "combat", Size::new(50, 50), Rect::new(5, 5, 40, 40));
        let session = Session::new(ContentIdentity::new("Combat"));
        let mut cfg = config(dir.path());
        cfg.window.manual = Some(Rect::new(40, 40, 30, 30));
        let mut bezel = Bezel::new(&session, cfg);
        let err = bezel.try_load().unwrap_err();
        let BezelError::ResolutionExhausted { last: Some(cause) } = err else {
            panic!("expected exhaustion with a cause");
        };
        assert!(matches!(
            *cause,
            BezelError::InvalidWindowGeometry {
                window: Some(_),
                ..
            }
        ));
        assert!(!bezel.is_shown());
        assert!(bezel.surface().is_none());
    }

    #[test]
    fn opaque_artwork_has_no_window() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(20, 20, Rgba([9, 9, 9, 255]))
            .save(dir.path().join("combat.png"))
            .unwrap();
        let session = Session::new(ContentIdentity::new("Combat"));
        let mut bezel = Bezel::new(&session, config(dir.path()));
        let err = bezel.try_load().unwrap_err();
        let BezelError::ResolutionExhausted { last: Some(cause) } = err else {
            panic!("expected exhaustion with a cause");
        };
        assert!(matches!(
            *cause,
            BezelError::InvalidWindowGeometry { window: None, .. }
        ));
    }

    #[test]
    fn missing_artwork_exhausts_without_cause() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(ContentIdentity::new("Combat"));
        let mut bezel = Bezel::new(&session, config(dir.path()));
        assert!(matches!(
            bezel.try_load(),
            Err(BezelError::ResolutionExhausted { last: None })
        ));
    }

    // Hands out surfaces one pixel wider than asked for.
    struct SloppyHost(Session);

    impl Presentation for SloppyHost {
        fn content(&self) -> ContentIdentity {
            self.0.content()
        }

        fn zoom(&self) -> f64 {
            self.0.zoom()
        }

        fn allocate_surface(
            &self,
            width: u32,
            height: u32,
        ) -> Result<SurfaceHandle, SurfaceError> {
            self.0.allocate_surface(width + 1, height)
        }
    }

    #[test]
    fn wrongly_sized_host_surface_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "combat", Size::new(50, 50), Rect::new(5, 5, 40, 40));
        let host = SloppyHost(Session::new(ContentIdentity::new("Combat")));
        let mut bezel = Bezel::new(&host, config(dir.path()));
        assert!(matches!(
            bezel.try_load(),
            Err(BezelError::SurfaceAllocation(SurfaceError::SizeMismatch { .. }))
        ));
        assert!(!bezel.load());
        bezel.apply();
        bezel.render(&RgbaImage::new(4, 4));
        assert!(bezel.output().is_none());
    }

    #[test]
    fn huge_zoom_is_refused_before_any_scaling() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "combat", Size::new(40, 30), Rect::new(5, 5, 30, 20));
        let session = Session::new(ContentIdentity::new("Combat"));
        let mut bezel = Bezel::new(&session, config(dir.path()));
        assert!(bezel.load());

        session.set_zoom(100_000.0);
        bezel.apply();
        assert!(bezel.output().is_none());
        assert!(bezel.live_rect().is_none());
        bezel.render(&RgbaImage::new(30, 20));

        session.set_zoom(2.0);
        bezel.apply();
        assert_eq!(bezel.output().unwrap().size(), Size::new(80, 60));
    }

    #[test]
    fn surface_allocation_failure_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "combat", Size::new(50, 50), Rect::new(5, 5, 40, 40));
        let session =
            Session::new(ContentIdentity::new("Combat")).with_max_surface(Size::new(32, 32));
        let mut bezel = Bezel::new(&session, config(dir.path()));
        assert!(matches!(
            bezel.try_load(),
            Err(BezelError::SurfaceAllocation(_))
        ));
        assert!(!bezel.is_shown());
    }

    #[test]
    fn border_size_uses_configured_profile() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(ContentIdentity::new("x"));
        let mut cfg = config(dir.path());
        cfg.blend.corner_fraction = 0.1;
        cfg.blend.edge_fraction = 0.1;
        let bezel = Bezel::new(&session, cfg);
        assert_eq!(bezel.border_size(0, 0, 100, 1), 10);
        assert_eq!(bezel.border_size(0, 0, 100, 4), 8);
        assert_eq!(bezel.border_size(0, 0, 100, 0), 0);
    }
}
