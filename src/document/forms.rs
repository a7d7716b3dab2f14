//! Form bodies and their validation.
//!
//! Invalid input never fails a request; the handlers redraw the form with
//! the field errors collected here.
use chrono::NaiveDateTime;

use crate::{
    post::{NewPost, PostChanges, PostView},
    user::UserProfile,
};

/// What datetime-local inputs post.
const PUB_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    /// Checkbox; present when ticked
    #[serde(default)]
    pub is_published: Option<String>,
}

/// A [`PostForm`] that passed validation.
#[derive(Debug)]
pub struct ValidPost {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub location: Option<i32>,
    pub category: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
}

impl PostForm {
    /// A fresh form with the publication date prefilled to now, the way
    /// authors usually want it.
    pub fn prefilled(now: NaiveDateTime) -> PostForm {
        PostForm {
            pub_date: now.format(PUB_DATE_FORMAT).to_string(),
            is_published: Some(String::from("on")),
            ..PostForm::default()
        }
    }

    /// The form as it looks when editing an existing post.
    pub fn from_view(view: &PostView) -> PostForm {
        PostForm {
            title: view.post.title.clone(),
            text: view.post.text.clone(),
            pub_date: view.post.pub_date.format(PUB_DATE_FORMAT).to_string(),
            location: view
                .post
                .location
                .map(|id| id.to_string())
                .unwrap_or_default(),
            category: view
                .post
                .category
                .map(|id| id.to_string())
                .unwrap_or_default(),
            image: view.post.image.clone().unwrap_or_default(),
            is_published: if view.post.is_published {
                Some(String::from("on"))
            } else {
                None
            },
        }
    }

    pub fn validate(&self) -> Result<ValidPost, Vec<String>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(String::from("Title must not be empty"));
        }
        if self.text.trim().is_empty() {
            errors.push(String::from("Text must not be empty"));
        }
        let pub_date = match NaiveDateTime::parse_from_str(&self.pub_date, PUB_DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(String::from(
                    "Publication date must look like 2026-01-31T18:00",
                ));
                None
            }
        };
        let location = parse_reference(&self.location).unwrap_or_else(|()| {
            errors.push(String::from("Location is not a valid choice"));
            None
        });
        let category = parse_reference(&self.category).unwrap_or_else(|()| {
            errors.push(String::from("Category is not a valid choice"));
            None
        });

        match pub_date {
            Some(pub_date) if errors.is_empty() => Ok(ValidPost {
                title: self.title.trim().to_owned(),
                text: self.text.trim().to_owned(),
                pub_date,
                location,
                category,
                image: match self.image.trim() {
                    "" => None,
                    image => Some(image.to_owned()),
                },
                is_published: self.is_published.is_some(),
            }),
            _ => Err(errors),
        }
    }
}

impl ValidPost {
    pub fn into_new(self, author: &str) -> NewPost {
        NewPost {
            title: self.title,
            text: self.text,
            pub_date: self.pub_date,
            author: author.to_owned(),
            location: self.location,
            category: self.category,
            image: self.image,
            is_published: self.is_published,
        }
    }

    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: self.title,
            text: self.text,
            pub_date: self.pub_date,
            location: self.location,
            category: self.category,
            image: self.image,
            is_published: self.is_published,
        }
    }
}

/// Empty select values mean "no reference".
fn parse_reference(value: &str) -> Result<Option<i32>, ()> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| ())
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, Vec<String>> {
        let text = self.text.trim();
        if text.is_empty() {
            Err(vec![String::from("Comment must not be empty")])
        } else {
            Ok(text.to_owned())
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<UserProfile, Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(String::from("Display name must not be empty"));
        }
        if !self.email.contains('@') {
            errors.push(String::from("Email address does not look valid"));
        }
        if errors.is_empty() {
            Ok(UserProfile {
                name: self.name.trim().to_owned(),
                email: self.email.trim().to_owned(),
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommentForm, PostForm};

    fn form() -> PostForm {
        PostForm {
            title: String::from("Hello"),
            text: String::from("World"),
            pub_date: String::from("2026-01-31T18:00"),
            location: String::new(),
            category: String::from("3"),
            image: String::new(),
            is_published: Some(String::from("on")),
        }
    }

    #[test]
    fn valid_form_passes() {
        let valid = form().validate().expect("form should validate");
        assert_eq!(valid.title, "Hello");
        assert_eq!(valid.category, Some(3));
        assert_eq!(valid.location, None);
        assert_eq!(valid.image, None);
        assert!(valid.is_published);
        assert_eq!(valid.pub_date.format("%Y-%m-%d").to_string(), "2026-01-31");
    }

    #[test]
    fn blank_fields_are_reported_together() {
        let mut form = form();
        form.title = String::from("  ");
        form.text = String::new();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn bad_date_is_an_error() {
        let mut form = form();
        form.pub_date = String::from("tomorrow-ish");
        assert!(form.validate().is_err());
    }

    #[test]
    fn bad_reference_is_an_error() {
        let mut form = form();
        form.category = String::from("general");
        assert!(form.validate().is_err());
    }

    #[test]
    fn unchecked_box_means_unpublished() {
        let mut form = form();
        form.is_published = None;
        assert!(!form.validate().unwrap().is_published);
    }

    #[test]
    fn comments_are_trimmed() {
        let form = CommentForm {
            text: String::from("  nice post  "),
        };
        assert_eq!(form.validate().unwrap(), "nice post");
        assert!(CommentForm::default().validate().is_err());
    }

    #[test]
    fn form_bodies_parse_from_urlencoded() {
        let form: PostForm =
            serde_urlencoded::from_bytes(b"title=Hi&text=Body&pub_date=2026-01-31T18%3A00")
                .unwrap();
        assert_eq!(form.title, "Hi");
        assert!(form.is_published.is_none());
        assert!(form.category.is_empty());
    }
}
