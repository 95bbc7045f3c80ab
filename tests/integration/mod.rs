pub mod pipeline_test;
pub mod services_test;
