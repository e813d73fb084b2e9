//! Manual deployment steps printed after a successful pre-flight run
//!
//! The backend goes to a Render web service. The `fullstack` profile also
//! publishes the static frontend through GitHub Pages and wires it to the
//! backend URL.

use crate::config::{PreflightConfig, Profile};
use std::io::{self, Write};

/// Environment variables the backend reads at runtime
pub const BACKEND_ENV_VARS: [&str; 4] = [
    "FLASK_SECRET_KEY",
    "YANDEX_AUTH_TOKEN",
    "YANDEX_FOLDER_ID",
    "GIGACHAT_API_KEY",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionStep {
    pub title: String,
    pub details: Vec<String>,
}

impl InstructionStep {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: Vec::new(),
        }
    }

    fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployInstructions {
    steps: Vec<InstructionStep>,
}

impl DeployInstructions {
    pub fn for_config(config: &PreflightConfig) -> Self {
        Self::for_profile(config.profile, &config.expected_branch)
    }

    pub fn for_profile(profile: Profile, branch: &str) -> Self {
        let mut steps = backend_steps(branch);
        if profile.includes_pages() {
            steps.extend(pages_steps(branch));
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[InstructionStep] {
        &self.steps
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Next steps:")?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(out, "{:>2}. {}", i + 1, step.title)?;
            for line in &step.details {
                writeln!(out, "      {}", line)?;
            }
        }
        Ok(())
    }
}

fn backend_steps(branch: &str) -> Vec<InstructionStep> {
    let mut env_step = InstructionStep::new("Add the environment variables from .env");
    for var in BACKEND_ENV_VARS {
        env_step = env_step.detail(var);
    }
    env_step = env_step.detail("RENDER=true (switches the app to production mode)");

    vec![
        InstructionStep::new("Push the release to GitHub")
            .detail(format!("git push origin {}", branch)),
        InstructionStep::new("Create a Render web service")
            .detail("New + -> Web Service, then connect this GitHub repository")
            .detail(format!("Deploy branch: {}", branch)),
        InstructionStep::new("Set the build command")
            .detail("pip install -r requirements.txt"),
        InstructionStep::new("Set the start command").detail("gunicorn app:app"),
        env_step,
        InstructionStep::new("Deploy and copy the service URL")
            .detail("https://<service-name>.onrender.com"),
    ]
}

fn pages_steps(branch: &str) -> Vec<InstructionStep> {
    vec![
        InstructionStep::new("Enable GitHub Pages")
            .detail("Settings -> Pages -> Deploy from a branch")
            .detail(format!("Branch: {} / (root)", branch)),
        InstructionStep::new("Point the frontend at the backend")
            .detail("Set the API base URL in the static files to the Render service URL"),
        InstructionStep::new("Allow the Pages origin on the backend")
            .detail("Add https://<username>.github.io to the CORS origins in app.py"),
    ]
}
