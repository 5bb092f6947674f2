use serde::{Deserialize, Serialize};

use super::user::{CurrentUser, UserUpdate};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: i64,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub id: i64,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

/// Response of `GET profiles/{id}/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub profile_id: Option<i64>,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub education: Option<Vec<Education>>,
    #[serde(default)]
    pub work_experience: Option<Vec<WorkExperience>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
}

/// Body of `POST profiles/`
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub user: i64,
}

/// Body of `PATCH profiles/{id}/`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileUpdate {
    pub bio: String,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

/// Account names plus profile details, as edited together by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableProfile {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub profile_id: Option<i64>,
}

/// Next id for a dynamic list: one past the last entry, or 1 when empty
fn next_id(last: Option<i64>) -> i64 {
    last.map(|id| id + 1).unwrap_or(1)
}

impl EditableProfile {
    pub fn from_parts(user: &CurrentUser, profile: Profile) -> Self {
        Self {
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            bio: profile.bio.unwrap_or_default(),
            education: profile.education.unwrap_or_default(),
            work_experience: profile.work_experience.unwrap_or_default(),
            skills: profile.skills.unwrap_or_default(),
            interests: profile.interests.unwrap_or_default(),
            profile_id: profile.profile_id,
        }
    }

    pub fn user_update(&self) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            bio: self.bio.clone(),
            education: self.education.clone(),
            work_experience: self.work_experience.clone(),
            skills: self.skills.clone(),
            interests: self.interests.clone(),
        }
    }

    /// Append a blank education entry and return it for editing
    pub fn add_education(&mut self) -> &mut Education {
        let id = next_id(self.education.last().map(|e| e.id));
        self.education.push(Education {
            id,
            ..Default::default()
        });
        let last = self.education.len() - 1;
        &mut self.education[last]
    }

    /// Remove an education entry; out-of-range indices are ignored
    pub fn remove_education(&mut self, index: usize) {
        if index < self.education.len() {
            self.education.remove(index);
        }
    }

    pub fn add_work_experience(&mut self) -> &mut WorkExperience {
        let id = next_id(self.work_experience.last().map(|w| w.id));
        self.work_experience.push(WorkExperience {
            id,
            ..Default::default()
        });
        let last = self.work_experience.len() - 1;
        &mut self.work_experience[last]
    }

    pub fn remove_work_experience(&mut self, index: usize) {
        if index < self.work_experience.len() {
            self.work_experience.remove(index);
        }
    }

    pub fn add_skill(&mut self, skill: &str) {
        push_unique(&mut self.skills, skill);
    }

    /// Remove a skill by case-insensitive name; returns whether it was present
    pub fn remove_skill(&mut self, skill: &str) -> bool {
        remove_ignore_case(&mut self.skills, skill)
    }

    pub fn add_interest(&mut self, interest: &str) {
        push_unique(&mut self.interests, interest);
    }

    pub fn remove_interest(&mut self, interest: &str) -> bool {
        remove_ignore_case(&mut self.interests, interest)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        return;
    }
    list.push(value.to_string());
}

fn remove_ignore_case(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    let before = list.len();
    list.retain(|v| !v.eq_ignore_ascii_case(value));
    list.len() != before
}
