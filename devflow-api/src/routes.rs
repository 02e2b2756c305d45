use crate::session::actor_id;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use devflow_app::domain::{
    AnswerSort, AnswerView, AnswersPage, HasVoted, NewAnswer, NewQuestion, NewUser, PageRequest,
    QuestionSummary, SaveResult, SavedQuestionsPage, SavedSort, TargetKind, UserProfile,
    VoteOutcome, VoteRequest,
};
use devflow_app::AppContext;
use devflow_errors::{ActionResponse, AppError};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

type ApiResult<T> = Result<Json<ActionResponse<T>>, AppError>;

pub fn router(ctx: AppContext) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_expiry(
        Expiry::OnInactivity(time::Duration::hours(ctx.config.session_ttl_hours)),
    );

    Router::new()
        .route("/api/votes", post(cast_vote))
        .route("/api/votes/{target_type}/{target_id}", get(has_voted))
        .route("/api/questions", post(create_question))
        .route("/api/questions/{id}", get(get_question).delete(delete_question))
        .route("/api/questions/{id}/answers", get(get_answers).post(create_answer))
        .route("/api/answers/{id}", delete(delete_answer))
        .route("/api/questions/{id}/save", post(toggle_save))
        .route("/api/questions/{id}/saved", get(has_saved))
        .route("/api/collections", get(saved_questions))
        .route("/api/accounts", post(register_user))
        .route("/api/users/{id}", get(get_user))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(ctx)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswersQuery {
    page: Option<u64>,
    page_size: Option<u64>,
    #[serde(default)]
    filter: AnswerSort,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionsQuery {
    page: Option<u64>,
    page_size: Option<u64>,
    query: Option<String>,
    #[serde(default)]
    filter: SavedSort,
}

#[derive(Deserialize)]
struct AnswerBody {
    content: String,
}

async fn cast_vote(
    State(ctx): State<AppContext>,
    session: Session,
    Json(request): Json<VoteRequest>,
) -> ApiResult<VoteOutcome> {
    let actor = actor_id(&session).await?;
    let outcome = ctx.votes.cast_vote(request, actor).await?;
    Ok(Json(ActionResponse::ok(outcome)))
}

async fn has_voted(
    State(ctx): State<AppContext>,
    session: Session,
    Path((target_type, target_id)): Path<(TargetKind, Uuid)>,
) -> ApiResult<HasVoted> {
    let actor = actor_id(&session).await?;
    let status = ctx.votes.has_voted(target_id, target_type, actor).await?;
    Ok(Json(ActionResponse::ok(status.into())))
}

async fn create_question(
    State(ctx): State<AppContext>,
    session: Session,
    Json(question): Json<NewQuestion>,
) -> ApiResult<QuestionSummary> {
    let actor = actor_id(&session).await?;
    let summary = ctx.questions.create_question(question, actor).await?;
    Ok(Json(ActionResponse::ok(summary)))
}

async fn get_question(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuestionSummary> {
    Ok(Json(ActionResponse::ok(ctx.questions.get_question(id).await?)))
}

async fn delete_question(
    State(ctx): State<AppContext>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let actor = actor_id(&session).await?;
    ctx.questions.delete_question(id, actor).await?;
    Ok(Json(ActionResponse::empty()))
}

async fn get_answers(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<AnswersQuery>,
) -> ApiResult<AnswersPage> {
    let page = PageRequest::new(params.page, params.page_size);
    let answers = ctx.answers.get_answers(id, page, params.filter).await?;
    Ok(Json(ActionResponse::ok(answers)))
}

async fn create_answer(
    State(ctx): State<AppContext>,
    session: Session,
    Path(question_id): Path<Uuid>,
    Json(body): Json<AnswerBody>,
) -> ApiResult<AnswerView> {
    let actor = actor_id(&session).await?;
    let new_answer = NewAnswer {
        question_id,
        content: body.content,
    };
    Ok(Json(ActionResponse::ok(ctx.answers.create_answer(new_answer, actor).await?)))
}

async fn delete_answer(
    State(ctx): State<AppContext>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let actor = actor_id(&session).await?;
    ctx.answers.delete_answer(id, actor).await?;
    Ok(Json(ActionResponse::empty()))
}

async fn toggle_save(
    State(ctx): State<AppContext>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<SaveResult> {
    let actor = actor_id(&session).await?;
    Ok(Json(ActionResponse::ok(ctx.collections.toggle_save_question(id, actor).await?)))
}

async fn has_saved(
    State(ctx): State<AppContext>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<SaveResult> {
    let actor = actor_id(&session).await?;
    Ok(Json(ActionResponse::ok(ctx.collections.has_saved_question(id, actor).await?)))
}

async fn saved_questions(
    State(ctx): State<AppContext>,
    session: Session,
    Query(params): Query<CollectionsQuery>,
) -> ApiResult<SavedQuestionsPage> {
    let actor = actor_id(&session).await?;
    let page = PageRequest::new(params.page, params.page_size);
    let saved = ctx
        .collections
        .get_saved_questions(actor, page, params.query.as_deref(), params.filter)
        .await?;
    Ok(Json(ActionResponse::ok(saved)))
}

async fn register_user(
    State(ctx): State<AppContext>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<UserProfile> {
    Ok(Json(ActionResponse::ok(ctx.accounts.register_user(new_user).await?)))
}

async fn get_user(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> ApiResult<UserProfile> {
    Ok(Json(ActionResponse::ok(ctx.accounts.get_user(id).await?)))
}
