use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Course, CourseCreate, CourseModule, CourseModuleCreate, Material};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseWithModules {
    #[serde(flatten)]
    pub course: Course,
    /// Ordered by `order_index`
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleBody {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub order_index: Option<i32>,
}

impl ModuleBody {
    pub fn into_create(self, course_id: Uuid) -> CourseModuleCreate {
        CourseModuleCreate {
            course_id,
            title: self.title,
            description: self.description,
            materials: self.materials,
            order_index: self.order_index,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreateBody {
    #[serde(flatten)]
    pub course: CourseCreate,
    /// Modules created together with the course, in the given order
    #[serde(default)]
    pub modules: Vec<ModuleBody>,
}

impl CourseCreateBody {
    pub fn validate(&self) -> Result<(), String> {
        validate_course(&self.course)
    }
}

pub fn validate_course(course: &CourseCreate) -> Result<(), String> {
    if course.title.trim().is_empty() {
        return Err(String::from("title must not be empty"));
    }
    if course.title.chars().count() > 100 {
        return Err(String::from("title must be at most 100 characters"));
    }
    if let Some(rating) = course.rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(String::from("rating must be between 0 and 5"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProgressBody {
    pub module_id: Uuid,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::{CourseLevel, MaterialKind};

    #[test]
    fn create_body_accepts_nested_modules() {
        let body: CourseCreateBody = serde_json::from_value(serde_json::json!({
            "title": "Rust for beginners",
            "description": "Ownership and borrowing",
            "instructor": "Jane",
            "duration": "6 weeks",
            "level": "Beginner",
            "modules": [{
                "title": "Ownership",
                "description": "moves and copies",
                "materials": [{"type": "video", "title": "intro", "url": "https://example.org/v.mp4", "duration": "10:00"}]
            }]
        }))
        .unwrap();

        assert_eq!(body.course.level, CourseLevel::Beginner);
        assert_eq!(body.modules.len(), 1);
        assert_eq!(body.modules[0].materials[0].kind, MaterialKind::Video);
        assert!(body.validate().is_ok());

        let id = Uuid::new_v4();
        let module = body.modules[0].clone().into_create(id);
        assert_eq!(module.course_id, id);
        assert_eq!(module.order_index, None);
    }

    #[test]
    fn course_validation() {
        let mut course = CourseCreate {
            title: String::from("a"),
            description: String::new(),
            instructor: String::new(),
            duration: String::new(),
            level: CourseLevel::Advanced,
            rating: Some(4.5),
            thumbnail: None,
        };
        assert!(validate_course(&course).is_ok());

        course.rating = Some(5.5);
        assert!(validate_course(&course).is_err());

        course.rating = None;
        course.title = "x".repeat(101);
        assert!(validate_course(&course).is_err());

        course.title = String::from("   ");
        assert!(validate_course(&course).is_err());
    }
}
