pub mod article_form;
pub mod articles;
pub mod login;
