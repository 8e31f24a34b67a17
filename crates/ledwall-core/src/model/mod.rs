// ── Domain model ──
//
// Value types shared by the store, reconciler and schedule model.

mod pixels;
mod status;
mod time;

pub use pixels::{LED_COUNT, PixelIndexMap};
pub use status::SystemStatus;
pub use time::{DayBounds, Period, TimeOfDay};
