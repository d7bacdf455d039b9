use common::{CourseInstanceRole, CourseRole};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entity::{
    course, course_instance, course_instance_permission, course_permission, enrollment, variant,
};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Roles of one user, resolved for the course (and course instance) a
/// variant belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ViewerRoles {
    pub user_id: i32,
    pub is_administrator: bool,
    pub course_role: CourseRole,
    pub course_instance_role: CourseInstanceRole,
}

/// Whether `viewer` may see `variant` and everything hanging off it
/// (generated files, submissions, workspace).
///
/// Variants generated inside a course instance hold student work, so staff
/// need a student-data role on that instance. Variants generated in preview
/// only need course Viewer, which also lets instructors open variants that
/// public users created from a shared question.
pub fn can_view_variant(variant: &variant::Model, viewer: &ViewerRoles) -> bool {
    if variant.user_id == viewer.user_id || viewer.is_administrator {
        return true;
    }
    match variant.course_instance_id {
        Some(_) => viewer.course_instance_role.can_view_student_data(),
        None => viewer.course_role.can_view(),
    }
}

pub async fn course_role<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    course_id: i32,
) -> Result<CourseRole, AppError> {
    let role = course_permission::Entity::find_by_id((user_id, course_id))
        .one(db)
        .await?
        .map(|p| p.course_role)
        .unwrap_or(CourseRole::None);
    Ok(role)
}

pub async fn course_instance_role<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    course_instance_id: i32,
) -> Result<CourseInstanceRole, AppError> {
    let role = course_instance_permission::Entity::find_by_id((user_id, course_instance_id))
        .one(db)
        .await?
        .map(|p| p.course_instance_role)
        .unwrap_or(CourseInstanceRole::None);
    Ok(role)
}

pub async fn is_enrolled<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    course_instance_id: i32,
) -> Result<bool, AppError> {
    let found = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseInstanceId.eq(course_instance_id))
        .one(db)
        .await?
        .is_some();
    Ok(found)
}

/// Return 403 unless the caller may view `variant`.
pub async fn authorize_variant<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    variant: &variant::Model,
) -> Result<(), AppError> {
    let course_instance_role = match variant.course_instance_id {
        Some(ci) => course_instance_role(db, auth_user.user_id, ci).await?,
        None => CourseInstanceRole::None,
    };
    let viewer = ViewerRoles {
        user_id: auth_user.user_id,
        is_administrator: auth_user.is_administrator,
        course_role: course_role(db, auth_user.user_id, variant.course_id).await?,
        course_instance_role,
    };

    if can_view_variant(variant, &viewer) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = auth_user.user_id,
            variant_id = variant.id,
            "Variant access denied"
        );
        Err(AppError::access_denied())
    }
}

/// Require course role at least Previewer (or administrator).
pub async fn require_course_preview<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course_id: i32,
) -> Result<(), AppError> {
    if auth_user.is_administrator || course_role(db, auth_user.user_id, course_id).await?.can_preview()
    {
        return Ok(());
    }
    Err(AppError::PermissionDenied(
        "Access denied: you do not have permission to preview questions in this course".into(),
    ))
}

/// Require course role at least Viewer (or administrator).
pub async fn require_course_view<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course_id: i32,
) -> Result<(), AppError> {
    if auth_user.is_administrator || course_role(db, auth_user.user_id, course_id).await?.can_view() {
        return Ok(());
    }
    Err(AppError::PermissionDenied(
        "Access denied: you must have course Viewer permissions".into(),
    ))
}

/// Require permission to change course files. Example courses are read-only
/// for everybody.
pub async fn require_course_edit<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course: &course::Model,
) -> Result<(), AppError> {
    if course.example_course {
        return Err(AppError::PermissionDenied(
            "Access denied: the example course cannot be edited. Copy it into your own course to make changes.".into(),
        ));
    }
    if auth_user.is_administrator
        || course_role(db, auth_user.user_id, course.id).await?.can_edit()
    {
        return Ok(());
    }
    Err(AppError::PermissionDenied(
        "Access denied: you must have course Editor permissions to edit files".into(),
    ))
}

/// Require that the caller can work in a course instance: enrolled students,
/// course instance staff, course staff and administrators.
pub async fn require_course_instance_access<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    course_instance: &course_instance::Model,
) -> Result<(), AppError> {
    if auth_user.is_administrator
        || is_enrolled(db, auth_user.user_id, course_instance.id).await?
        || course_instance_role(db, auth_user.user_id, course_instance.id)
            .await?
            .can_view_student_data()
        || course_role(db, auth_user.user_id, course_instance.course_id)
            .await?
            .can_preview()
    {
        return Ok(());
    }
    Err(AppError::PermissionDenied(
        "Access denied: you are not enrolled in this course instance".into(),
    ))
}
