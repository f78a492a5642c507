pub mod mag_frontend;
pub mod treewalk_interpreter;
