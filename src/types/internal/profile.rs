use crate::types::db::user::{self, UserRole};

/// Role with the data that only makes sense for that role. Students always
/// carry their teacher link; teachers and admins never do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Student { teacher_id: String },
    Teacher,
    Admin,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Student { .. } => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Validated user profile. Built from a `users` row exactly once, at the
/// read boundary; handlers downstream can rely on the role invariants
/// without re-checking nullable columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self.role, Role::Teacher)
    }

    pub fn is_student(&self) -> bool {
        matches!(self.role, Role::Student { .. })
    }

    /// The student's teacher link, when there is one.
    pub fn teacher_id(&self) -> Option<&str> {
        match &self.role {
            Role::Student { teacher_id } => Some(teacher_id.as_str()),
            _ => None,
        }
    }
}

/// A profile row that violates its role's invariants.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("student {0} has no teacher link")]
    StudentWithoutTeacher(String),
}

impl TryFrom<user::Model> for UserProfile {
    type Error = ProfileError;

    fn try_from(row: user::Model) -> Result<Self, Self::Error> {
        let role = match row.role {
            UserRole::Student => match row.teacher_id {
                Some(teacher_id) => Role::Student { teacher_id },
                None => return Err(ProfileError::StudentWithoutTeacher(row.id)),
            },
            UserRole::Teacher => Role::Teacher,
            UserRole::Admin => Role::Admin,
        };

        Ok(UserProfile {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
        })
    }
}
