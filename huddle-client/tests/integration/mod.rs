pub mod media_tests;
pub mod room_tests;
pub mod signaling_tests;
