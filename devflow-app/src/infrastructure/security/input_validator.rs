use crate::domain::{NewQuestion, NewUser, PageRequest, MAX_PAGE_SIZE};
use devflow_errors::{AppError, FieldErrors};

const MAX_CONTENT_LENGTH: usize = 20_000;
const MIN_TITLE_LENGTH: usize = 5;
const MAX_TITLE_LENGTH: usize = 100;
const MAX_TAGS: usize = 3;
const MAX_TAG_LENGTH: usize = 15;
const MAX_QUERY_LENGTH: usize = 200;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQuestion {
    pub title: String,
    pub content: String,
    /// Lower-case, de-duplicated, in submission order.
    pub tags: Vec<String>,
}

pub struct InputValidator;

impl InputValidator {
    pub fn answer_content(content: &str) -> Result<String, AppError> {
        let content = Self::clean(content);
        let mut errors = FieldErrors::new();
        Self::check_content("content", &content, &mut errors);
        Self::finish(errors)?;
        Ok(content)
    }

    pub fn question(question: &NewQuestion) -> Result<ValidQuestion, AppError> {
        let mut errors = FieldErrors::new();

        let title = Self::clean(&question.title);
        let title_len = title.chars().count();
        if title_len < MIN_TITLE_LENGTH {
            push(&mut errors, "title", format!("must be at least {MIN_TITLE_LENGTH} characters"));
        } else if title_len > MAX_TITLE_LENGTH {
            push(&mut errors, "title", format!("must be at most {MAX_TITLE_LENGTH} characters"));
        }

        let content = Self::clean(&question.content);
        Self::check_content("content", &content, &mut errors);

        let mut tags: Vec<String> = Vec::new();
        for raw in &question.tags {
            let tag = raw.trim().to_lowercase();
            if tag.is_empty() {
                push(&mut errors, "tags", "must not contain empty tags");
                continue;
            }
            if tag.chars().count() > MAX_TAG_LENGTH {
                push(&mut errors, "tags", format!("'{tag}' is longer than {MAX_TAG_LENGTH} characters"));
                continue;
            }
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if question.tags.is_empty() {
            push(&mut errors, "tags", "at least one tag is required");
        } else if tags.len() > MAX_TAGS {
            push(&mut errors, "tags", format!("at most {MAX_TAGS} tags are allowed"));
        }

        Self::finish(errors)?;
        Ok(ValidQuestion {
            title,
            content,
            tags,
        })
    }

    pub fn page(page: PageRequest) -> Result<PageRequest, AppError> {
        let mut errors = FieldErrors::new();
        if page.page == 0 {
            push(&mut errors, "page", "must be at least 1");
        }
        if page.page_size == 0 || page.page_size > MAX_PAGE_SIZE {
            push(&mut errors, "pageSize", format!("must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Self::finish(errors)?;
        Ok(page)
    }

    /// Blank queries mean "no filter".
    pub fn search_query(query: Option<&str>) -> Result<Option<String>, AppError> {
        let Some(query) = query.map(Self::clean).filter(|q| !q.is_empty()) else {
            return Ok(None);
        };
        if query.chars().count() > MAX_QUERY_LENGTH {
            return Err(AppError::invalid_field(
                "query",
                format!("must be at most {MAX_QUERY_LENGTH} characters"),
            ));
        }
        Ok(Some(query))
    }

    pub fn new_user(user: &NewUser) -> Result<NewUser, AppError> {
        let mut errors = FieldErrors::new();

        let name = Self::clean(&user.name);
        if name.is_empty() {
            push(&mut errors, "name", "must not be empty");
        }

        let username = user.username.trim().to_string();
        let username_len = username.chars().count();
        if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username_len) {
            push(
                &mut errors,
                "username",
                format!("must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"),
            );
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            push(&mut errors, "username", "may only contain letters, digits, '_' and '-'");
        }

        let email = user.email.trim().to_lowercase();
        if !looks_like_email(&email) {
            push(&mut errors, "email", "must be a valid email address");
        }

        let image = user
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self::finish(errors)?;
        Ok(NewUser {
            name,
            username,
            email,
            image,
        })
    }

    fn check_content(field: &str, content: &str, errors: &mut FieldErrors) {
        if content.is_empty() {
            push(errors, field, "must not be empty");
        } else if content.chars().count() > MAX_CONTENT_LENGTH {
            push(errors, field, format!("must be at most {MAX_CONTENT_LENGTH} characters"));
        }
    }

    fn clean(text: &str) -> String {
        text.trim()
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    }

    fn finish(errors: FieldErrors) -> Result<(), AppError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(errors))
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
