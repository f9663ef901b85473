pub mod achievement;
pub mod game_result;
pub mod lesson;
pub mod progress;
pub mod test_attempt;
pub mod user;
