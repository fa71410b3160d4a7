pub mod course;
pub mod knowledge;
pub mod module_passed;
pub mod question;
pub mod test_result;
pub mod user;
pub mod user_answer;
