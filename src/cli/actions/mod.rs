pub mod login;
pub mod server;
pub mod verify;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Login(login::Args),
    Verify(verify::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
            Self::Login(args) => login::execute(args).await,
            Self::Verify(args) => verify::execute(args).await,
        }
    }
}
