pub mod signin;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    SignIn(signin::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
