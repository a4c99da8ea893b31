pub type Id = i32;
