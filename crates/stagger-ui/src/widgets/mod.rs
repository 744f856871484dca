mod staggered_list;

pub use staggered_list::*;
