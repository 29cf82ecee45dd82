//! Navigation shell
//!
//! Signed-out users see the auth stack (Onboarding, Login, Signup,
//! ForgotPassword). Signed-in users see five tabs; the Home tab owns the
//! HomeMain → Questions → Advice flow plus Pricing. [`AppNavigator`] swaps
//! between the two whenever the session changes.

use advice_client::AnswerSet;
use app_core::{validate_situation, Submission, ValidationErrors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Navigation error types
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Route belongs to the other shell
    #[error("{route} is not reachable (signed in: {signed_in})")]
    WrongShell {
        /// Route name
        route: &'static str,
        /// Whether the main tabs are showing
        signed_in: bool,
    },

    /// Route parameters failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavigationError>;

// =============================================================================
// Route Definitions
// =============================================================================

/// All screens in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    // Auth stack
    /// Welcome screen
    #[default]
    Onboarding,
    /// Sign in
    Login,
    /// Create account
    Signup,
    /// Password reset
    ForgotPassword,

    // Home stack
    /// Situation entry
    HomeMain,
    /// Questionnaire
    Questions {
        /// Situation being described
        situation: String,
    },
    /// Advice result
    Advice {
        /// Situation being described
        situation: String,
        /// Questionnaire answers
        answers: AnswerSet,
        /// Stored advice to show instead of requesting new advice
        #[serde(default, skip_serializing_if = "Option::is_none")]
        advice: Option<String>,
    },
    /// Plan catalog
    Pricing,

    // Tab roots
    /// Advice history
    History,
    /// Saved favorites
    Saved,
    /// Profile
    Profile,
    /// Settings
    Settings,
}

impl Route {
    /// Screen name
    pub fn name(&self) -> &'static str {
        match self {
            Route::Onboarding => "Onboarding",
            Route::Login => "Login",
            Route::Signup => "Signup",
            Route::ForgotPassword => "ForgotPassword",
            Route::HomeMain => "HomeMain",
            Route::Questions { .. } => "Questions",
            Route::Advice { .. } => "Advice",
            Route::Pricing => "Pricing",
            Route::History => "History",
            Route::Saved => "Saved",
            Route::Profile => "Profile",
            Route::Settings => "Settings",
        }
    }

    /// Whether the route is only reachable when signed in
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Route::Onboarding | Route::Login | Route::Signup | Route::ForgotPassword
        )
    }

    /// Tab whose root this route is, if any
    pub fn tab_root(&self) -> Option<NavigationTab> {
        match self {
            Route::HomeMain => Some(NavigationTab::Home),
            Route::History => Some(NavigationTab::History),
            Route::Saved => Some(NavigationTab::Saved),
            Route::Profile => Some(NavigationTab::Profile),
            Route::Settings => Some(NavigationTab::Settings),
            _ => None,
        }
    }
}

impl From<Submission> for Route {
    fn from(submission: Submission) -> Self {
        Route::Advice {
            situation: submission.situation,
            answers: submission.answers,
            advice: None,
        }
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTab {
    /// Home tab
    #[default]
    Home,
    /// History tab
    History,
    /// Saved tab
    Saved,
    /// Profile tab
    Profile,
    /// Settings tab
    Settings,
}

impl NavigationTab {
    /// Get the root route for this tab
    pub fn root_route(&self) -> Route {
        match self {
            NavigationTab::Home => Route::HomeMain,
            NavigationTab::History => Route::History,
            NavigationTab::Saved => Route::Saved,
            NavigationTab::Profile => Route::Profile,
            NavigationTab::Settings => Route::Settings,
        }
    }

    /// Get label for this tab
    pub fn label(&self) -> &'static str {
        match self {
            NavigationTab::Home => "Home",
            NavigationTab::History => "History",
            NavigationTab::Saved => "Saved",
            NavigationTab::Profile => "Profile",
            NavigationTab::Settings => "Settings",
        }
    }

    /// Position in the tab bar
    pub fn index(&self) -> usize {
        match self {
            NavigationTab::Home => 0,
            NavigationTab::History => 1,
            NavigationTab::Saved => 2,
            NavigationTab::Profile => 3,
            NavigationTab::Settings => 4,
        }
    }

    /// Get all tabs in order
    pub fn all() -> [NavigationTab; 5] {
        [
            NavigationTab::Home,
            NavigationTab::History,
            NavigationTab::Saved,
            NavigationTab::Profile,
            NavigationTab::Settings,
        ]
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self {
            route,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Stack of screens above a fixed root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStack {
    root: StackEntry,
    pushed: Vec<StackEntry>,
}

impl NavigationStack {
    /// Create a new navigation stack with a root route
    pub fn new(root: Route) -> Self {
        Self {
            root: StackEntry::new(root),
            pushed: Vec::new(),
        }
    }

    /// Push a route onto the stack
    pub fn push(&mut self, route: Route) {
        self.pushed.push(StackEntry::new(route));
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.pushed.pop().is_some()
    }

    /// Pop to root
    pub fn pop_to_root(&mut self) {
        self.pushed.clear();
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.pushed.last().unwrap_or(&self.root)
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.pushed.is_empty()
    }

    /// Get stack depth
    pub fn depth(&self) -> usize {
        self.pushed.len() + 1
    }

    /// Routes from root to top
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        std::iter::once(&self.root).chain(&self.pushed).map(|e| &e.route)
    }

    /// Reset to a new root
    pub fn reset(&mut self, route: Route) {
        self.root = StackEntry::new(route);
        self.pushed.clear();
    }
}

// =============================================================================
// App Navigator
// =============================================================================

/// Which navigator is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    /// Signed-out stack
    Auth,
    /// Signed-in tabs
    Main,
}

/// Top-level navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppNavigator {
    shell: Shell,
    auth_stack: NavigationStack,
    active_tab: NavigationTab,
    tab_stacks: [NavigationStack; 5],
}

impl AppNavigator {
    /// Start on the shell matching the session
    pub fn new(signed_in: bool) -> Self {
        Self {
            shell: if signed_in { Shell::Main } else { Shell::Auth },
            auth_stack: NavigationStack::new(Route::Onboarding),
            active_tab: NavigationTab::Home,
            tab_stacks: NavigationTab::all().map(|tab| NavigationStack::new(tab.root_route())),
        }
    }

    /// Which navigator is showing
    pub fn shell(&self) -> Shell {
        self.shell
    }

    /// Active tab (meaningful in the main shell)
    pub fn active_tab(&self) -> NavigationTab {
        self.active_tab
    }

    /// Follow a session change
    ///
    /// Switching shells resets both navigators. Returns whether the shell
    /// changed.
    pub fn sync_auth(&mut self, signed_in: bool) -> bool {
        let next = if signed_in { Shell::Main } else { Shell::Auth };
        if next == self.shell {
            return false;
        }

        tracing::debug!(?next, "switching navigator");
        *self = Self::new(signed_in);
        true
    }

    /// Screen on top
    pub fn current_route(&self) -> &Route {
        self.current_stack().current()
    }

    /// Stack that is showing
    pub fn current_stack(&self) -> &NavigationStack {
        match self.shell {
            Shell::Auth => &self.auth_stack,
            Shell::Main => &self.tab_stacks[self.active_tab.index()],
        }
    }

    fn tab_stack_mut(&mut self, tab: NavigationTab) -> &mut NavigationStack {
        &mut self.tab_stacks[tab.index()]
    }

    /// Show `route`
    ///
    /// Tab roots switch tabs; Home-stack screens are pushed on the Home tab.
    pub fn navigate(&mut self, route: Route) -> Result<()> {
        let signed_in = self.shell == Shell::Main;
        if route.requires_auth() != signed_in {
            return Err(NavigationError::WrongShell { route: route.name(), signed_in });
        }

        match self.shell {
            Shell::Auth => {
                if route == Route::Onboarding {
                    self.auth_stack.pop_to_root();
                } else {
                    self.auth_stack.push(route);
                }
            }
            Shell::Main => {
                if let Some(tab) = route.tab_root() {
                    self.switch_tab(tab);
                    self.tab_stack_mut(tab).pop_to_root();
                } else {
                    self.active_tab = NavigationTab::Home;
                    self.tab_stack_mut(NavigationTab::Home).push(route);
                }
            }
        }
        Ok(())
    }

    /// Validate the situation and open the questionnaire
    pub fn start_questionnaire(&mut self, situation: &str) -> Result<()> {
        validate_situation(situation)?;
        self.navigate(Route::Questions { situation: situation.to_string() })
    }

    /// Open the advice screen for a finished questionnaire
    pub fn show_advice(&mut self, submission: Submission) -> Result<()> {
        self.navigate(Route::from(submission))
    }

    /// Replay stored advice; answers are not kept for replays
    pub fn replay_advice(&mut self, situation: &str, advice: &str) -> Result<()> {
        self.navigate(Route::Advice {
            situation: situation.to_string(),
            answers: AnswerSet::placeholder(),
            advice: Some(advice.to_string()),
        })
    }

    /// Go back one screen
    pub fn go_back(&mut self) -> bool {
        match self.shell {
            Shell::Auth => self.auth_stack.pop(),
            Shell::Main => self.tab_stack_mut(self.active_tab).pop(),
        }
    }

    /// Switch to a tab
    pub fn switch_tab(&mut self, tab: NavigationTab) {
        if self.shell == Shell::Main {
            self.active_tab = tab;
        }
    }

    /// Return to the situation entry screen
    pub fn start_over(&mut self) {
        if self.shell == Shell::Main {
            self.active_tab = NavigationTab::Home;
            self.tab_stack_mut(NavigationTab::Home).pop_to_root();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::Questionnaire;

    fn answers() -> AnswerSet {
        AnswerSet::new(["Alone", "Quiet and calm", "Yes, once"]).unwrap()
    }

    #[test]
    fn test_route_serialization() {
        let route = Route::Questions { situation: "Gym".to_string() };
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["route"], "Questions");
        assert_eq!(json["params"]["situation"], "Gym");

        let advice = Route::Advice { situation: "Gym".to_string(), answers: answers(), advice: None };
        let json = serde_json::to_string(&advice).unwrap();
        let parsed: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, advice);
    }

    #[test]
    fn test_advice_route_rejects_short_answers() {
        let json = r#"{"route":"Advice","params":{"situation":"Gym","answers":["Alone"]}}"#;
        assert!(serde_json::from_str::<Route>(json).is_err());
    }

    #[test]
    fn test_stack() {
        let mut stack = NavigationStack::new(Route::HomeMain);
        assert!(!stack.can_go_back());
        assert!(!stack.pop());

        stack.push(Route::Pricing);
        assert_eq!(stack.current(), &Route::Pricing);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.routes().count(), 2);

        stack.pop_to_root();
        assert_eq!(stack.current(), &Route::HomeMain);

        stack.reset(Route::Settings);
        assert_eq!(stack.current(), &Route::Settings);
    }

    #[test]
    fn test_tabs() {
        let labels: Vec<&str> = NavigationTab::all().iter().map(|t| t.label()).collect();
        assert_eq!(labels, ["Home", "History", "Saved", "Profile", "Settings"]);
        assert_eq!(NavigationTab::Saved.root_route(), Route::Saved);
    }

    #[test]
    fn test_signed_out_shell() {
        let mut nav = AppNavigator::new(false);
        assert_eq!(nav.shell(), Shell::Auth);
        assert_eq!(nav.current_route(), &Route::Onboarding);

        nav.navigate(Route::Login).unwrap();
        nav.navigate(Route::ForgotPassword).unwrap();
        assert!(nav.go_back());
        assert_eq!(nav.current_route(), &Route::Login);

        let err = nav.navigate(Route::HomeMain).unwrap_err();
        assert!(matches!(err, NavigationError::WrongShell { route: "HomeMain", signed_in: false }));
    }

    #[test]
    fn test_auth_change_switches_shell() {
        let mut nav = AppNavigator::new(false);
        nav.navigate(Route::Signup).unwrap();

        assert!(nav.sync_auth(true));
        assert_eq!(nav.shell(), Shell::Main);
        assert_eq!(nav.current_route(), &Route::HomeMain);
        assert!(!nav.sync_auth(true));

        nav.navigate(Route::Pricing).unwrap();
        assert!(nav.sync_auth(false));
        assert_eq!(nav.current_route(), &Route::Onboarding);
        assert!(nav.navigate(Route::Settings).is_err());
    }

    #[test]
    fn test_home_flow() {
        let mut nav = AppNavigator::new(true);

        let err = nav.start_questionnaire("hi").unwrap_err();
        assert!(err.to_string().contains("Please describe the situation first"));

        nav.start_questionnaire("At a coffee shop").unwrap();
        assert_eq!(nav.current_route().name(), "Questions");

        let mut questionnaire = Questionnaire::new("At a coffee shop");
        questionnaire.select("Alone").unwrap();
        questionnaire.select("Quiet and calm").unwrap();
        let app_core::Step::Submitted(submission) = questionnaire.select("Yes, once").unwrap() else {
            panic!("expected submission");
        };
        nav.show_advice(submission).unwrap();

        match nav.current_route() {
            Route::Advice { answers, advice, .. } => {
                assert_eq!(answers.eye_contact(), "Yes, once");
                assert!(advice.is_none());
            }
            other => panic!("unexpected route {:?}", other),
        }
        assert_eq!(nav.current_stack().depth(), 3);

        nav.start_over();
        assert_eq!(nav.current_route(), &Route::HomeMain);
    }

    #[test]
    fn test_tab_roots_switch_tabs() {
        let mut nav = AppNavigator::new(true);
        nav.navigate(Route::History).unwrap();
        assert_eq!(nav.active_tab(), NavigationTab::History);

        nav.replay_advice("Gym", "Keep it light.").unwrap();
        assert_eq!(nav.active_tab(), NavigationTab::Home);
        match nav.current_route() {
            Route::Advice { answers, advice, .. } => {
                assert!(answers.is_placeholder());
                assert_eq!(advice.as_deref(), Some("Keep it light."));
            }
            other => panic!("unexpected route {:?}", other),
        }

        nav.switch_tab(NavigationTab::Settings);
        assert_eq!(nav.current_route(), &Route::Settings);
        assert!(!nav.go_back());
    }
}
