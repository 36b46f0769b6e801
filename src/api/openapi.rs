use super::handlers::{applications, auth::session, health, posts, Message, Success};
use crate::store::{DeleteAck, InsertAck, UpdateAck};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::issue,
        session::logout,
        posts::list,
        posts::create,
        posts::search_by_title,
        posts::get,
        posts::by_organizer,
        posts::update,
        posts::delete,
        applications::create,
        applications::by_applicant,
        applications::by_organizer,
        applications::applied_post_details,
        applications::applied_post_details_by_path,
        applications::cancel,
    ),
    components(
        schemas(
            health::Health,
            posts::TitleSearch,
            Message,
            Success,
            InsertAck,
            UpdateAck,
            DeleteAck,
        )
    ),
    tags(
        (name = "health", description = "Build and database status"),
        (name = "auth", description = "Cookie sessions"),
        (name = "posts", description = "Volunteer opportunities"),
        (name = "applications", description = "Volunteer sign-ups"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
