/// Temporal blend weight generators
pub mod alpha;
/// Cell-to-tile assignment and still rendering
pub mod composer;
/// Sorted, consumable tile index
pub mod index;
/// Exact and fast tile selection
pub mod selection;
/// Transition video rendering
pub mod video;
