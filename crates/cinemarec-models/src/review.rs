use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    /// Author, identified by email
    pub user_email: String,
    pub movie_title: String,
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Review {
    pub fn is_authored_by(&self, email: &str) -> bool {
        self.user_email.eq_ignore_ascii_case(email)
    }
}

/// Fields the author fills in when creating or editing a review
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub movie_title: String,
    pub rating: u8,
    pub text: String,
}

impl From<&Review> for ReviewDraft {
    fn from(review: &Review) -> Self {
        Self {
            movie_title: review.movie_title.clone(),
            rating: review.rating,
            text: review.text.clone(),
        }
    }
}
