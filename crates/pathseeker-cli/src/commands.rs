//! Subcommand handlers.

use anyhow::{anyhow, bail, Result};
use tracing::warn;

use pathseeker_core::config::Config;
use pathseeker_core::models::{Education, EditableProfile, Registration, UserRole, WorkExperience};
use pathseeker_core::quiz::QuizState;
use pathseeker_core::utils::{format_optional, mask_token, truncate_string};
use pathseeker_core::{ApiClient, ApiError};

use crate::prompt;
use crate::EditArgs;

/// Turn an API error into the message shown to the user
fn describe(error: &ApiError) -> String {
    match error {
        ApiError::NetworkError(_) => "Network error. Could not connect to the server.".to_string(),
        ApiError::Unauthorized(_) | ApiError::RefreshFailed(_) | ApiError::NotAuthenticated => {
            "You are not signed in. Run `pathseeker login` first.".to_string()
        }
        ApiError::Validation(msg) | ApiError::InvalidCredentials(msg) => msg.clone(),
        other => other.to_string(),
    }
}

pub async fn login(client: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    println!("\n=== PathSeeker Login ===\n");

    let email = match email {
        Some(email) => email,
        None => prompt::line_or("Email", config.last_email.as_deref().unwrap_or_default())?,
    };
    let password = prompt::password("Password: ")?;

    if email.is_empty() || password.is_empty() {
        bail!("Please fill in email and password fields.");
    }

    println!("\nSigning in...");
    if let Err(e) = client.login(&email, &password).await {
        bail!(describe(&e));
    }

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    match client.current_user().await {
        Ok(user) => println!("Login successful! Signed in as {}.\n", user.display_name()),
        Err(e) => {
            warn!(error = %e, "Failed to fetch current user");
            println!("Login successful!\n");
        }
    }
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.logout()?;
    println!("Signed out.");
    Ok(())
}

pub fn status(client: &ApiClient, config: &Config) -> Result<()> {
    let session = client.session();
    println!("API:           {}", client.base_url());
    println!("Token storage: {}", config.token_backend.display_name());
    if session.is_authenticated() {
        println!("Session:       signed in");
    } else {
        println!("Session:       signed out");
    }
    let access = session.access_token().map(|t| mask_token(&t));
    let refresh = session.refresh_token().map(|t| mask_token(&t));
    println!("Access token:  {}", format_optional(&access, "-"));
    println!("Refresh token: {}", format_optional(&refresh, "-"));
    Ok(())
}

pub async fn register(client: &ApiClient) -> Result<()> {
    println!("\n=== Create your PathSeeker account ===\n");

    let mut form = Registration {
        first_name: prompt::line_or("First name", "")?,
        last_name: prompt::line_or("Last name", "")?,
        email: prompt::line_or("Email", "")?,
        username: prompt::line_or("Username (optional)", "")?,
        ..Registration::default()
    };
    let role = prompt::line_or("Role (student/graduate/professional)", UserRole::default().as_str())?;
    form.role = Some(UserRole::parse(&role).unwrap_or_default());
    form.password = prompt::password("Password: ")?;
    form.confirm_password = prompt::password("Confirm password: ")?;

    if let Err(e) = client.register(&form).await {
        bail!(describe(&e));
    }

    println!("\nAccount created. Run `pathseeker login` to sign in.");
    Ok(())
}

async fn load_profile(client: &ApiClient) -> Result<EditableProfile> {
    if !client.session().is_authenticated() {
        bail!(describe(&ApiError::NotAuthenticated));
    }
    client
        .load_profile()
        .await
        .map_err(|e| anyhow!(describe(&e)))
}

fn print_profile(profile: &EditableProfile) {
    let name = format!("{} {}", profile.first_name, profile.last_name);
    println!("\n=== {} ===\n", name.trim());
    if profile.bio.is_empty() {
        println!("Bio:        -");
    } else {
        println!("Bio:        {}", truncate_string(&profile.bio, 200));
    }
    println!("Skills:     {}", list_or_dash(&profile.skills));
    println!("Interests:  {}", list_or_dash(&profile.interests));

    if !profile.education.is_empty() {
        println!("\nEducation:");
        for (i, edu) in profile.education.iter().enumerate() {
            println!(
                "  {}. {} {} at {} ({} - {})",
                i + 1,
                edu.degree,
                edu.field_of_study,
                edu.institution,
                edu.start_date,
                edu.end_date
            );
        }
    }
    if !profile.work_experience.is_empty() {
        println!("\nWork experience:");
        for (i, work) in profile.work_experience.iter().enumerate() {
            println!(
                "  {}. {} at {} ({} - {})",
                i + 1,
                work.title,
                work.company,
                work.start_date,
                work.end_date
            );
            if !work.description.is_empty() {
                println!("     {}", truncate_string(&work.description, 200));
            }
        }
    }
    println!();
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub async fn profile_show(client: &ApiClient) -> Result<()> {
    let profile = load_profile(client).await?;
    print_profile(&profile);
    Ok(())
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.add_skills.is_empty()
            && self.remove_skills.is_empty()
            && self.add_interests.is_empty()
            && self.remove_interests.is_empty()
            && self.add_education.is_empty()
            && self.remove_education.is_empty()
            && self.add_work.is_empty()
            && self.remove_work.is_empty()
    }

    fn apply(&self, profile: &mut EditableProfile) {
        if let Some(ref first) = self.first_name {
            profile.first_name = first.clone();
        }
        if let Some(ref last) = self.last_name {
            profile.last_name = last.clone();
        }
        if let Some(ref bio) = self.bio {
            profile.bio = bio.clone();
        }
        for skill in &self.add_skills {
            profile.add_skill(skill);
        }
        for skill in &self.remove_skills {
            profile.remove_skill(skill);
        }
        for interest in &self.add_interests {
            profile.add_interest(interest);
        }
        for interest in &self.remove_interests {
            profile.remove_interest(interest);
        }

        // Numbers refer to the listing before this edit, so remove from the end
        for index in descending(&self.remove_education) {
            profile.remove_education(index);
        }
        for index in descending(&self.remove_work) {
            profile.remove_work_experience(index);
        }
        for edu in &self.add_education {
            let entry = profile.add_education();
            *entry = Education { id: entry.id, ..edu.clone() };
        }
        for work in &self.add_work {
            let entry = profile.add_work_experience();
            *entry = WorkExperience { id: entry.id, ..work.clone() };
        }
    }
}

/// 1-based entry numbers as distinct 0-based indices, highest first
fn descending(numbers: &[usize]) -> Vec<usize> {
    let mut indices: Vec<usize> = numbers.iter().filter(|&&n| n > 0).map(|n| n - 1).collect();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();
    indices
}

/// Split a comma-separated entry into exactly `N` trimmed fields.
/// The last field keeps any further commas.
fn split_fields<const N: usize>(value: &str) -> [String; N] {
    let mut fields: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, part) in fields.iter_mut().zip(value.splitn(N, ',')) {
        *slot = part.trim().to_string();
    }
    fields
}

/// Parse `institution,degree,field,start,end`; institution is required
pub fn parse_education(value: &str) -> Result<Education, String> {
    let [institution, degree, field_of_study, start_date, end_date] = split_fields::<5>(value);
    if institution.is_empty() {
        return Err("expected institution,degree,field,start,end".to_string());
    }
    Ok(Education {
        id: 0,
        institution,
        degree,
        field_of_study,
        start_date,
        end_date,
    })
}

/// Parse `company,title,start,end,description`; company is required
pub fn parse_work_experience(value: &str) -> Result<WorkExperience, String> {
    let [company, title, start_date, end_date, description] = split_fields::<5>(value);
    if company.is_empty() {
        return Err("expected company,title,start,end,description".to_string());
    }
    Ok(WorkExperience {
        id: 0,
        company,
        title,
        start_date,
        end_date,
        description,
    })
}

/// Prompt for the basic fields, keeping current values on empty input
fn edit_interactively(profile: &mut EditableProfile) -> Result<()> {
    profile.first_name = prompt::line_or("First name", &profile.first_name)?;
    profile.last_name = prompt::line_or("Last name", &profile.last_name)?;
    profile.bio = prompt::line_or("Bio", &profile.bio)?;

    let skill = prompt::line("Add a skill (blank to skip): ")?;
    if !skill.is_empty() {
        profile.add_skill(&skill);
    }
    let interest = prompt::line("Add an interest (blank to skip): ")?;
    if !interest.is_empty() {
        profile.add_interest(&interest);
    }

    let institution = prompt::line("Add education - institution (blank to skip): ")?;
    if !institution.is_empty() {
        let degree = prompt::line_or("Degree", "")?;
        let field_of_study = prompt::line_or("Field of study", "")?;
        let start_date = prompt::line_or("Start date", "")?;
        let end_date = prompt::line_or("End date", "")?;
        let entry = profile.add_education();
        *entry = Education {
            id: entry.id,
            institution,
            degree,
            field_of_study,
            start_date,
            end_date,
        };
    }

    let company = prompt::line("Add work experience - company (blank to skip): ")?;
    if !company.is_empty() {
        let title = prompt::line_or("Title", "")?;
        let start_date = prompt::line_or("Start date", "")?;
        let end_date = prompt::line_or("End date", "")?;
        let description = prompt::line_or("Description", "")?;
        let entry = profile.add_work_experience();
        *entry = WorkExperience {
            id: entry.id,
            company,
            title,
            start_date,
            end_date,
            description,
        };
    }
    Ok(())
}

pub async fn profile_edit(client: &ApiClient, args: EditArgs) -> Result<()> {
    let mut profile = load_profile(client).await?;

    if args.is_empty() {
        edit_interactively(&mut profile)?;
    } else {
        args.apply(&mut profile);
    }

    if let Err(e) = client.save_profile(&profile).await {
        bail!(describe(&e));
    }
    println!("Profile saved.");
    print_profile(&profile);
    Ok(())
}

pub fn quiz() -> Result<()> {
    let mut quiz = QuizState::new();
    println!("\n=== Career Assessment ===");

    loop {
        let question = quiz.current_question();
        println!(
            "\nQuestion {} of {} ({:.0}% complete)",
            quiz.current_index() + 1,
            quiz.total(),
            quiz.progress_percent()
        );
        println!("{}\n", question.text);
        for (i, option) in question.options.iter().enumerate() {
            let marker = if quiz.current_answer() == Some(i) { "*" } else { " " };
            println!(" {} {}. {}", marker, i + 1, option);
        }

        let input = prompt::line("\nChoose 1-4, [n]ext, [p]revious, [q]uit: ")?;
        match input.to_lowercase().as_str() {
            "q" => return Ok(()),
            "p" => {
                if !quiz.previous() {
                    println!("Already at the first question.");
                }
            }
            "n" | "" => {
                if quiz.current_answer().is_none() {
                    println!("Please choose an answer first.");
                } else if quiz.is_last() {
                    break;
                } else {
                    quiz.next();
                }
            }
            choice => match choice.parse::<usize>() {
                Ok(n) if n >= 1 && quiz.answer(n - 1) => {
                    if quiz.is_last() {
                        if quiz.is_complete() {
                            break;
                        }
                    } else {
                        quiz.next();
                    }
                }
                _ => println!("Unknown choice: {}", choice),
            },
        }
    }

    println!("\n=== Your answers ===\n");
    for (question, answer) in quiz.responses() {
        println!("{}\n  -> {}", question, answer);
    }
    println!();
    Ok(())
}
