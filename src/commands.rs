//! Command handlers

use anyhow::{anyhow, bail, Context};
use app_core::{
    clear_history, delete_account, plan_options, subscribe, validate_forgot_password,
    validate_login, validate_profile, validate_signup, AdviceRecord, AdviceSession,
    AdviceSessionError, BackOutcome, LibraryError, PricingPlan, Questionnaire, SaveToggle, Step,
    QUESTIONS,
};
use app_state::{Plan, User, UserUpdate};
use app_ui::{AppNavigator, NavigationError, Route, ThemeMode};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

use crate::app::App;
use crate::cli::{Command, HistoryAction, SavedAction, SettingsAction};
use crate::output::{short_id, Palette};

const BACK_LABEL: &str = "Back";

pub async fn run(app: &mut App, command: Command) -> anyhow::Result<()> {
    let palette = Palette::new(app.theme.colors());

    let result = match command {
        Command::Login { email } => login(app, &palette, email).await,
        Command::Signup { name, email } => signup(app, &palette, name, email).await,
        Command::Logout => logout(app, &palette).await,
        Command::ForgotPassword { email } => forgot_password(app, &palette, email).await,
        Command::Whoami => whoami(app, &palette),
        Command::Profile { name, email } => profile(app, &palette, name, email).await,
        Command::Plans => plans(app, &palette),
        Command::Subscribe { plan } => subscribe_to(app, &palette, plan).await,
        Command::Theme { mode } => theme(app, mode),
        Command::Advise { situation } => advise(app, &palette, situation).await,
        Command::History { action } => history(app, &palette, action.unwrap_or(HistoryAction::List)),
        Command::Saved { action } => saved(app, &palette, action.unwrap_or(SavedAction::List)),
        Command::Settings { action } => {
            settings(app, &palette, action.unwrap_or(SettingsAction::Show)).await
        }
    };

    app.sync_navigation();
    app.flush();
    result
}

fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

fn ask(prompt: &str, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::<String>::with_theme(&prompt_theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?),
    }
}

fn ask_password(prompt: &str) -> anyhow::Result<String> {
    Ok(Password::with_theme(&prompt_theme())
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?)
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(Confirm::with_theme(&prompt_theme())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn signed_in(app: &App) -> anyhow::Result<User> {
    app.session
        .current_user()
        .ok_or_else(|| anyhow!("Not signed in. Run `social-confidence login` first."))
}

fn signed_out(app: &App) -> anyhow::Result<()> {
    if let Some(user) = app.session.current_user() {
        bail!("Already signed in as {}. Run `social-confidence logout` first.", user.email);
    }
    Ok(())
}

// =============================================================================
// Account
// =============================================================================

async fn login(app: &mut App, palette: &Palette, email: Option<String>) -> anyhow::Result<()> {
    signed_out(app)?;
    app.navigator.navigate(Route::Login)?;

    let email = ask("Email", email)?;
    let password = ask_password("Password")?;
    if let Err(errors) = validate_login(&email, &password) {
        palette.print_errors(&errors);
        return Err(errors).context("Invalid login details");
    }

    if !app.session.login(&email, &password).await {
        bail!("Invalid email or password");
    }
    println!("{}", palette.success("Login successful"));
    Ok(())
}

async fn signup(
    app: &mut App,
    palette: &Palette,
    name: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    signed_out(app)?;
    app.navigator.navigate(Route::Signup)?;

    let name = ask("Full name", name)?;
    let email = ask("Email", email)?;
    let password = ask_password("Create a password")?;
    let confirm_password = ask_password("Confirm your password")?;
    if let Err(errors) = validate_signup(&name, &email, &password, &confirm_password) {
        palette.print_errors(&errors);
        return Err(errors).context("Invalid signup details");
    }

    if !app.session.signup(&name, &email, &password).await {
        bail!("Failed to create account");
    }
    println!("{}", palette.success("Account created successfully"));
    Ok(())
}

async fn logout(app: &mut App, palette: &Palette) -> anyhow::Result<()> {
    signed_in(app)?;
    if !app.session.logout().await {
        bail!("Failed to log out");
    }
    println!("{}", palette.success("Logged out successfully"));
    Ok(())
}

async fn forgot_password(
    app: &mut App,
    palette: &Palette,
    email: Option<String>,
) -> anyhow::Result<()> {
    signed_out(app)?;
    app.navigator.navigate(Route::ForgotPassword)?;

    let email = ask("Email", email)?;
    if let Err(errors) = validate_forgot_password(&email) {
        palette.print_errors(&errors);
        return Err(errors).context("Invalid email");
    }

    if !app.session.forgot_password(&email).await {
        bail!("Failed to send reset link");
    }
    println!(
        "{}",
        palette.success(&format!(
            "We've sent a password reset link to {email}. Please check your email and follow the instructions."
        ))
    );
    Ok(())
}

fn whoami(app: &App, palette: &Palette) -> anyhow::Result<()> {
    match app.session.current_user() {
        Some(user) => {
            println!("{}", palette.title(&user.name));
            println!("{}", user.email);
            println!("{}", palette.muted(&format!("{} plan", user.plan.display_name())));
        }
        None => println!("{}", palette.muted("Not signed in")),
    }
    Ok(())
}

async fn profile(
    app: &mut App,
    palette: &Palette,
    name: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let user = signed_in(app)?;
    app.navigator.navigate(Route::Profile)?;

    let (name, email) = if name.is_none() && email.is_none() {
        let name = Input::<String>::with_theme(&prompt_theme())
            .with_prompt("Name")
            .with_initial_text(user.name.clone())
            .allow_empty(true)
            .interact_text()?;
        let email = Input::<String>::with_theme(&prompt_theme())
            .with_prompt("Email")
            .with_initial_text(user.email.clone())
            .interact_text()?;
        (name, email)
    } else {
        (name.unwrap_or(user.name), email.unwrap_or(user.email))
    };

    if let Err(errors) = validate_profile(&name) {
        palette.print_errors(&errors);
        return Err(errors).context("Invalid profile");
    }

    let update = UserUpdate::default().with_name(name).with_email(email);
    app.session
        .try_update_user(update)
        .await
        .context("Failed to update profile")?;
    println!("{}", palette.success("Profile updated successfully"));
    Ok(())
}

// =============================================================================
// Plans
// =============================================================================

fn plans(app: &mut App, palette: &Palette) -> anyhow::Result<()> {
    let current = app.session.current_user().map(|user| user.plan);
    if current.is_some() {
        app.navigator.navigate(Route::Pricing)?;
    }

    for option in plan_options(current) {
        let pricing = option.pricing;
        println!("{}  {}", palette.title(pricing.name), palette.muted(&price_label(pricing)));
        for feature in pricing.features {
            println!("  {} {}", palette.success("✓"), feature);
        }
        println!("  {}", palette.accent(&format!("[{}]", option.action_label())));
        println!();
    }
    Ok(())
}

fn price_label(pricing: &PricingPlan) -> String {
    format!("{} {}", pricing.price, pricing.billing)
}

async fn subscribe_to(app: &mut App, palette: &Palette, plan: Plan) -> anyhow::Result<()> {
    signed_in(app)?;
    app.navigator.navigate(Route::Pricing)?;

    if !subscribe(&app.session, plan).await {
        bail!("Failed to change plan");
    }
    println!(
        "{}",
        palette.success(&format!("Subscribed to {} plan", plan.display_name()))
    );
    Ok(())
}

// =============================================================================
// Theme
// =============================================================================

fn theme(app: &App, mode: Option<ThemeMode>) -> anyhow::Result<()> {
    if let Some(mode) = mode {
        if !app.theme.set_mode(mode) {
            tracing::warn!("theme applied for this run only");
        }
    }

    let snapshot = app.theme.snapshot();
    let palette = Palette::new(snapshot.colors);
    let appearance = if snapshot.is_dark { "dark" } else { "light" };
    println!(
        "{} {}",
        palette.title(&format!("Theme: {}", snapshot.mode)),
        palette.muted(&format!("({appearance})"))
    );

    let colors = snapshot.colors;
    let named = [
        ("background", colors.background),
        ("card", colors.card),
        ("text", colors.text),
        ("subtext", colors.subtext),
        ("primary", colors.primary),
        ("secondary", colors.secondary),
        ("border", colors.border),
        ("error", colors.error),
        ("success", colors.success),
    ];
    for (name, hex) in named {
        println!("{} {:<11}{}", palette.swatch(hex), name, palette.muted(hex));
    }
    Ok(())
}

// =============================================================================
// Advice
// =============================================================================

async fn advise(app: &mut App, palette: &Palette, situation: Option<String>) -> anyhow::Result<()> {
    signed_in(app)?;
    app.navigator.navigate(Route::HomeMain)?;

    let situation = ask("Describe the social situation", situation)?;
    let mut questionnaire = match begin_questionnaire(&mut app.navigator, situation) {
        Ok(questionnaire) => questionnaire,
        Err(e) => {
            eprintln!("{}", palette.error(&e.to_string()));
            return Err(e.into());
        }
    };
    let submission = loop {
        let index = questionnaire.current_index();
        let question = questionnaire.current_question();
        let default = questionnaire
            .answer(index)
            .and_then(|answer| question.options.iter().position(|option| *option == answer))
            .unwrap_or(0);

        let mut items: Vec<&str> = question.options.to_vec();
        items.push(BACK_LABEL);

        let choice = Select::with_theme(&prompt_theme())
            .with_prompt(format!(
                "Question {} of {}: {}",
                index + 1,
                QUESTIONS.len(),
                question.prompt
            ))
            .items(&items)
            .default(default)
            .interact()?;

        if choice == question.options.len() {
            match questionnaire.back() {
                BackOutcome::Previous(_) => continue,
                BackOutcome::Exit => {
                    app.navigator.go_back();
                    return Ok(());
                }
            }
        }

        match questionnaire.select_index(choice)? {
            Step::Next(_) => {}
            Step::Submitted(submission) => break submission,
        }
    };

    app.navigator.show_advice(submission.clone())?;
    let session = AdviceSession::start(app.services(), submission.situation, submission.answers);
    await_advice(&session, palette).await;

    loop {
        let save_label = if session.is_saved() {
            "Remove from saved"
        } else {
            "Save to favorites"
        };
        let actions = ["Get another suggestion", save_label, "Share", "Start over"];
        let choice = Select::with_theme(&prompt_theme())
            .with_prompt("What next?")
            .items(&actions)
            .default(0)
            .interact()?;

        match choice {
            0 => {
                session.generate();
                await_advice(&session, palette).await;
            }
            1 => toggle_saved(&session, palette),
            2 => {
                if let Some(text) = session.share_text() {
                    println!("{text}");
                }
            }
            _ => {
                session.cancel();
                app.navigator.start_over();
                return Ok(());
            }
        }
    }
}

/// Open the Questions screen and its state machine for the same situation text
fn begin_questionnaire(
    navigator: &mut AppNavigator,
    situation: String,
) -> Result<Questionnaire, NavigationError> {
    navigator.start_questionnaire(&situation)?;
    Ok(Questionnaire::new(situation))
}

async fn await_advice(session: &AdviceSession, palette: &Palette) {
    println!("{}", palette.muted("Generating personalized advice..."));
    if let Some(record) = session.wait().await {
        palette.print_advice(&record.situation, &record.advice);
    }
    if session.shows_upgrade_prompt() {
        println!("{}", palette.accent("Want more personalized advice?"));
        println!(
            "{}",
            palette.muted("Upgrade to Premium for unlimited advice and advanced features.")
        );
        println!();
    }
}

fn toggle_saved(session: &AdviceSession, palette: &Palette) {
    match session.toggle_saved() {
        Ok(SaveToggle::Saved) => println!("{}", palette.success("Advice saved to favorites")),
        Ok(SaveToggle::Removed) => println!("{}", palette.muted("Removed from favorites")),
        Err(AdviceSessionError::Library(LibraryError::SavedLimitReached { limit })) => eprintln!(
            "{}",
            palette.error(&format!(
                "You can save up to {limit} items on the Free plan. Upgrade to save more."
            ))
        ),
        Err(e) => eprintln!("{}", palette.error(&e.to_string())),
    }
}

// =============================================================================
// History and saved
// =============================================================================

fn resolve<'a>(records: &'a [AdviceRecord], id: &str) -> anyhow::Result<&'a AdviceRecord> {
    let mut matches = records
        .iter()
        .filter(|record| record.id == id || record.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (Some(_), Some(_)) => bail!("More than one entry starts with {id}"),
        (None, _) => bail!("No entry with id {id}"),
    }
}

fn show_record(app: &mut App, palette: &Palette, record: &AdviceRecord) -> anyhow::Result<()> {
    app.navigator.replay_advice(&record.situation, &record.advice)?;
    let session = AdviceSession::replay(app.services(), record.clone());
    println!("{}", palette.muted(&record.date_label()));
    palette.print_advice(session.situation(), &record.advice);
    if session.is_saved() {
        println!("{}", palette.accent("Saved"));
    }
    Ok(())
}

fn history(app: &mut App, palette: &Palette, action: HistoryAction) -> anyhow::Result<()> {
    let user = signed_in(app)?;
    app.navigator.navigate(Route::History)?;
    let records = app.library.history(&user.id)?;

    match action {
        HistoryAction::List => {
            println!("{}", palette.title("History"));
            if records.is_empty() {
                println!("{}", palette.muted("No History Yet"));
                println!(
                    "{}",
                    palette.muted(
                        "Your advice history will appear here once you start getting advice."
                    )
                );
            }
            for record in &records {
                palette.print_record_summary(record);
            }
        }
        HistoryAction::Show { id } => {
            let record = resolve(&records, &id)?.clone();
            show_record(app, palette, &record)?;
        }
        HistoryAction::Remove { id } => {
            let record = resolve(&records, &id)?;
            app.library.remove_history(&user.id, &record.id)?;
            println!("{}", palette.success(&format!("Removed {}", short_id(&record.id))));
        }
        HistoryAction::Clear => {
            if !confirm("Are you sure you want to clear your advice history? This action cannot be undone.")? {
                return Ok(());
            }
            clear_history(&app.session, &app.library)?;
            println!("{}", palette.success("History cleared successfully"));
        }
    }
    Ok(())
}

fn saved(app: &mut App, palette: &Palette, action: SavedAction) -> anyhow::Result<()> {
    let user = signed_in(app)?;
    app.navigator.navigate(Route::Saved)?;
    let records = app.library.saved(&user.id)?;

    match action {
        SavedAction::List => {
            println!("{}", palette.title("Saved Advice"));
            if records.is_empty() {
                println!("{}", palette.muted("No Saved Advice"));
                println!(
                    "{}",
                    palette.muted(
                        "When you find advice you like, save it from the advice screen for later reference."
                    )
                );
            }
            for record in &records {
                palette.print_record_summary(record);
            }
        }
        SavedAction::Show { id } => {
            let record = resolve(&records, &id)?.clone();
            show_record(app, palette, &record)?;
        }
        SavedAction::Remove { id } => {
            let record = resolve(&records, &id)?;
            if !confirm("Are you sure you want to remove this advice from your saved list?")? {
                return Ok(());
            }
            app.library.unsave(&user.id, &record.id)?;
            println!("{}", palette.muted("Removed from favorites"));
        }
    }
    Ok(())
}

// =============================================================================
// Settings
// =============================================================================

async fn settings(app: &mut App, palette: &Palette, action: SettingsAction) -> anyhow::Result<()> {
    signed_in(app)?;
    app.navigator.navigate(Route::Settings)?;

    match action {
        SettingsAction::Show => {
            let current = app.settings.get();
            let state = |on: bool| if on { "on" } else { "off" };
            println!("{}", palette.title("Settings"));
            println!("notifications  {}", state(current.notifications));
            println!("save-history   {}", state(current.save_history));
            println!("theme          {}", app.theme.mode());
        }
        SettingsAction::Notifications { enabled } => {
            app.settings.set_notifications(enabled);
            println!("{}", palette.success("Settings updated"));
        }
        SettingsAction::SaveHistory { enabled } => {
            app.settings.set_save_history(enabled);
            println!("{}", palette.success("Settings updated"));
        }
        SettingsAction::ClearHistory => {
            if !confirm("Are you sure you want to clear your advice history? This action cannot be undone.")? {
                return Ok(());
            }
            clear_history(&app.session, &app.library)?;
            println!("{}", palette.success("History cleared successfully"));
        }
        SettingsAction::DeleteAccount { yes } => {
            if !yes
                && !confirm("Are you sure you want to delete your account? All your data will be permanently removed. This action cannot be undone.")?
            {
                return Ok(());
            }
            if !delete_account(&app.session, &app.library).await? {
                bail!("Failed to delete account");
            }
            println!("{}", palette.success("Account deleted successfully"));
        }
    }
    Ok(())
}
