#[path = "hatching/end_to_end.rs"]
mod end_to_end;
#[path = "hatching/path_ordering.rs"]
mod path_ordering;
#[path = "hatching/pen_lift.rs"]
mod pen_lift;
