pub mod find_landmarks_use_case;
pub mod pipeline_logger;
