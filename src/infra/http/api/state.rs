use std::sync::Arc;

use crate::application::repos::HealthRepo;
use crate::application::students::StudentService;

#[derive(Clone)]
pub struct ApiState {
    pub students: Arc<StudentService>,
    pub db: Arc<dyn HealthRepo>,
}
