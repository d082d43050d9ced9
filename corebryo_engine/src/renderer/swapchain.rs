/// Swapchain policy - extent, image count, present mode and format selection
///
/// Backends query the surface and feed the results through these helpers so the
/// selection rules stay identical across backends and testable without a GPU.

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimized windows report a zero-area extent
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, 1.0 when height is zero
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Surface limits relevant to swapchain creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `u32::MAX` width means the surface size follows the swapchain
    pub current_extent: Extent2D,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
}

/// Presentation modes the core knows how to rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

/// Pick the swapchain extent
///
/// A fixed surface size wins; otherwise the requested size is clamped into the
/// surface's [min, max] range.
pub fn choose_extent(caps: &SurfaceCapabilities, requested: Extent2D) -> Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    Extent2D {
        width: requested.width.clamp(caps.min_extent.width, caps.max_extent.width.max(caps.min_extent.width)),
        height: requested.height.clamp(caps.min_extent.height, caps.max_extent.height.max(caps.min_extent.height)),
    }
}

/// One image more than the minimum, capped by the maximum when there is one
pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// FIFO under vsync; otherwise mailbox, then immediate, then FIFO
///
/// FIFO is always supported, so it is the fallback for every case.
pub fn choose_present_mode(available: &[PresentMode], vsync: bool) -> PresentMode {
    if vsync {
        return PresentMode::Fifo;
    }

    if available.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else if available.contains(&PresentMode::Immediate) {
        PresentMode::Immediate
    } else {
        PresentMode::Fifo
    }
}

/// First reported surface format, or `preferred` when the surface has no preference
///
/// A surface that reports a single undefined format accepts any format.
/// Returns `None` only when nothing was reported.
pub fn choose_surface_format<F: Copy>(
    available: &[F],
    is_undefined: impl Fn(&F) -> bool,
    preferred: F,
) -> Option<F> {
    match available {
        [] => None,
        [only] if is_undefined(only) => Some(preferred),
        [first, ..] => Some(*first),
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
