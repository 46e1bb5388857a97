//! Reviews left by users on content.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// A user's review of a single content entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// User who wrote the review
    pub reviewer: UserId,

    /// Positive rating
    pub rating: u32,

    pub text: String,

    /// Day the review was written or last edited
    pub date: NaiveDate,
}

impl Review {
    /// Create a review dated today
    pub fn new(reviewer: UserId, rating: u32, text: impl Into<String>) -> Self {
        Self {
            reviewer,
            rating,
            text: text.into(),
            date: Utc::now().date_naive(),
        }
    }

    /// Replace rating and text, re-stamping the date
    pub fn edit(&mut self, rating: u32, text: impl Into<String>) {
        self.rating = rating;
        self.text = text.into();
        self.date = Utc::now().date_naive();
    }

    /// Date as dd-mm-yyyy
    pub fn formatted_date(&self) -> String {
        self.date.format("%d-%m-%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_restamps_date() {
        let mut review = Review::new(UserId::new(), 3, "fine");
        review.date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        assert_eq!(review.formatted_date(), "02-01-2020");

        let before = Utc::now().date_naive();
        review.edit(5, "better on rewatch");
        assert_eq!(review.rating, 5);
        assert_eq!(review.text, "better on rewatch");
        assert!(review.date >= before);
        assert!(review.date > NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    }
}
