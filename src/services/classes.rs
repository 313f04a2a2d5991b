use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{on_unique_violation, ApiError};
use crate::models::class::{Class, ClassEnrollment, EnrollmentStatus, RosterEntry};
use crate::models::user::Role;

/// Unambiguous alphabet for join codes (no 0/O, 1/I/L).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub struct ClassService;

impl ClassService {
    /// Relationship query used by the access validator. Consults only the
    /// class record's teacher_id: secondary assignments do not pass.
    pub async fn is_owning_teacher_of(
        pool: &PgPool,
        teacher_id: Uuid,
        class_id: Uuid,
    ) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1 AND teacher_id = $2)",
        )
        .bind(class_id)
        .bind(teacher_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn is_actively_enrolled(
        pool: &PgPool,
        student_id: Uuid,
        class_id: Uuid,
    ) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM class_enrollments
                 WHERE student_id = $1 AND class_id = $2 AND status = 'approved'
             )",
        )
        .bind(student_id)
        .bind(class_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Creates a class; the creating teacher becomes the owning teacher and
    /// gets a primary assignment row in the same transaction. Join-code
    /// collisions are retried with a fresh code.
    pub async fn create(pool: &PgPool, teacher_id: Uuid, name: &str) -> Result<Class, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("class name is required"));
        }

        for attempt in 0..5 {
            let code = generate_class_code();
            let mut tx = pool.begin().await?;

            let res = sqlx::query_as::<_, Class>(
                "INSERT INTO classes (name, class_code, teacher_id)
                 VALUES ($1, $2, $3)
                 RETURNING *",
            )
            .bind(name)
            .bind(&code)
            .bind(teacher_id)
            .fetch_one(&mut *tx)
            .await;

            let class = match res {
                Ok(class) => class,
                Err(sqlx::Error::Database(db))
                    if db.is_unique_violation()
                        && db.constraint() == Some("classes_class_code_key") =>
                {
                    tracing::debug!("class code collision, retrying (attempt {attempt})");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            sqlx::query(
                "INSERT INTO teacher_class_assignments (class_id, teacher_id, is_primary)
                 VALUES ($1, $2, TRUE)",
            )
            .bind(class.id)
            .bind(teacher_id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            return Ok(class);
        }
        Err(ApiError::Upstream(anyhow::anyhow!(
            "could not generate a unique class code"
        )))
    }

    pub async fn get(pool: &PgPool, class_id: Uuid) -> Result<Class, ApiError> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(class_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Role-dependent listing: teachers see classes they are assigned to,
    /// students the ones they are enrolled in, parents the ones their
    /// approved children attend, admins everything.
    pub async fn list_for(pool: &PgPool, user_id: Uuid, role: Role) -> Result<Vec<Class>, ApiError> {
        let classes = match role {
            Role::Admin => {
                sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY name")
                    .fetch_all(pool)
                    .await?
            }
            Role::Teacher => {
                sqlx::query_as::<_, Class>(
                    "SELECT c.* FROM classes c
                     JOIN teacher_class_assignments a ON a.class_id = c.id
                     WHERE a.teacher_id = $1
                     ORDER BY c.name",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
            Role::Student => {
                sqlx::query_as::<_, Class>(
                    "SELECT c.* FROM classes c
                     JOIN class_enrollments e ON e.class_id = c.id
                     WHERE e.student_id = $1 AND e.status = 'approved'
                     ORDER BY c.name",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
            Role::Parent => {
                sqlx::query_as::<_, Class>(
                    "SELECT DISTINCT c.* FROM classes c
                     JOIN class_enrollments e ON e.class_id = c.id
                     JOIN parent_child_links l
                       ON l.child_id = e.student_id AND l.status = 'approved'
                     WHERE l.parent_id = $1 AND e.status = 'approved'
                     ORDER BY c.name",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(classes)
    }

    /// Student self-enrollment by join code. Possession of the code is the
    /// authorization, so the enrollment lands approved directly. Duplicates
    /// are rejected by the partial unique index.
    pub async fn enroll_by_code(
        pool: &PgPool,
        student_id: Uuid,
        class_code: &str,
    ) -> Result<ClassEnrollment, ApiError> {
        let class_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM classes WHERE class_code = $1")
                .bind(class_code.trim().to_uppercase())
                .fetch_optional(pool)
                .await?;
        let Some(class_id) = class_id else {
            return Err(ApiError::NotFound);
        };

        Self::insert_enrollment(pool, student_id, class_id).await
    }

    /// Direct enrollment by the owning teacher or an admin. The target must
    /// hold the student role.
    pub async fn direct_enroll(
        pool: &PgPool,
        student_id: Uuid,
        class_id: Uuid,
    ) -> Result<ClassEnrollment, ApiError> {
        let is_student: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role = 'student')",
        )
        .bind(student_id)
        .fetch_one(pool)
        .await?;
        if !is_student {
            return Err(ApiError::validation("target user is not a student"));
        }
        Self::get(pool, class_id).await?;

        Self::insert_enrollment(pool, student_id, class_id).await
    }

    async fn insert_enrollment(
        pool: &PgPool,
        student_id: Uuid,
        class_id: Uuid,
    ) -> Result<ClassEnrollment, ApiError> {
        let enrollment = sqlx::query_as::<_, ClassEnrollment>(
            "INSERT INTO class_enrollments (student_id, class_id, status)
             VALUES ($1, $2, 'approved')
             RETURNING *",
        )
        .bind(student_id)
        .bind(class_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            on_unique_violation(
                e,
                "class_enrollments_live_pair",
                "student is already enrolled in this class",
            )
        })?;
        Ok(enrollment)
    }

    /// Moves the live enrollment for (class, student) to a new status.
    pub async fn set_enrollment_status(
        pool: &PgPool,
        class_id: Uuid,
        student_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<ClassEnrollment, ApiError> {
        let enrollment = sqlx::query_as::<_, ClassEnrollment>(
            "UPDATE class_enrollments
             SET status = $1
             WHERE class_id = $2 AND student_id = $3
               AND status IN ('pending', 'approved')
             RETURNING *",
        )
        .bind(status.to_string())
        .bind(class_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
        enrollment.ok_or(ApiError::NotFound)
    }

    pub async fn roster(pool: &PgPool, class_id: Uuid) -> Result<Vec<RosterEntry>, ApiError> {
        let entries = sqlx::query_as::<_, RosterEntry>(
            "SELECT e.student_id, u.display_name, u.email, e.status, e.enrolled_at
             FROM class_enrollments e
             JOIN users u ON u.id = e.student_id
             WHERE e.class_id = $1 AND e.status IN ('pending', 'approved')
             ORDER BY u.display_name",
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_class_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
