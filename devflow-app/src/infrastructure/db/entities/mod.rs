pub mod answer;
pub mod collection;
pub mod interaction;
pub mod question;
pub mod tag;
pub mod tag_question;
pub mod user;
pub mod vote;

pub use answer::Entity as Answer;
pub use collection::Entity as Collection;
pub use interaction::Entity as Interaction;
pub use question::Entity as Question;
pub use tag::Entity as Tag;
pub use tag_question::Entity as TagQuestion;
pub use user::Entity as User;
pub use vote::Entity as Vote;
