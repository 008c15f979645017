use crate::auth::{generate_token, hash_password, token_digest, verify_password};
use crate::error::AppError;
use crate::models::{NewUser, Page, PageRequest, Profile, Subscription, User, UserRecord};
use crate::traits::{SubscriptionStore, UserStore};
use crate::validation::{validate_password, validate_registration};

const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

/// Registration, token login, profiles and author subscriptions.
pub struct AccountService<U, S>
where
    U: UserStore,
    S: SubscriptionStore,
{
    users: U,
    subscriptions: S,
}

impl<U, S> AccountService<U, S>
where
    U: UserStore,
    S: SubscriptionStore,
{
    pub fn new(users: U, subscriptions: S) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    pub async fn register(&self, input: NewUser) -> Result<User, AppError> {
        let valid = validate_registration(input)?;

        if self.users.email_exists(&valid.email).await? {
            return Err(AppError::validation(
                "email",
                "A user with that email already exists.",
            ));
        }
        if self.users.username_exists(&valid.username).await? {
            return Err(AppError::validation(
                "username",
                "A user with that username already exists.",
            ));
        }

        let record = UserRecord {
            password_hash: hash_password(&valid.password)?,
            email: valid.email,
            username: valid.username,
            first_name: valid.first_name,
            last_name: valid.last_name,
        };
        let user = self.users.create_user(&record).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a new token. Returns the raw token,
    /// which is never stored.
    pub async fn login(&self, email: Option<String>, password: Option<String>) -> Result<String, AppError> {
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::validation("email", "This field is required."))?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("password", "This field is required."))?;

        let Some(credentials) = self.users.credentials_by_email(&email).await? else {
            tracing::warn!(%email, "Login rejected: unknown email");
            return Err(AppError::validation("non_field_errors", BAD_CREDENTIALS));
        };
        if !verify_password(&password, &credentials.password_hash)? {
            tracing::warn!(user_id = credentials.user.id, "Login rejected: wrong password");
            return Err(AppError::validation("non_field_errors", BAD_CREDENTIALS));
        }

        let token = generate_token();
        self.users
            .insert_token(credentials.user.id, &token_digest(&token))
            .await?;
        tracing::info!(user_id = credentials.user.id, "Token issued");
        Ok(token)
    }

    pub async fn logout(&self, user: &User) -> Result<(), AppError> {
        let removed = self.users.delete_tokens(user.id).await?;
        tracing::info!(user_id = user.id, removed, "Tokens revoked");
        Ok(())
    }

    /// Resolve a raw token to its user, if the token is known.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, AppError> {
        self.users.user_by_token(&token_digest(token)).await
    }

    pub async fn profile(&self, id: i64, viewer: Option<&User>) -> Result<Profile, AppError> {
        self.users
            .get_profile(id, viewer.map(|v| v.id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id}")))
    }

    pub async fn list_profiles(
        &self,
        viewer: Option<&User>,
        page: PageRequest,
    ) -> Result<Page<Profile>, AppError> {
        self.users.list_profiles(viewer.map(|v| v.id), page).await
    }

    pub async fn set_password(
        &self,
        user: &User,
        current_password: Option<String>,
        new_password: Option<String>,
    ) -> Result<(), AppError> {
        let current = current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("current_password", "This field is required."))?;
        let new = new_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("new_password", "This field is required."))?;
        validate_password("new_password", &new, &[&user.username, &user.email])?;

        let credentials = self
            .users
            .credentials_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user.id)))?;
        if !verify_password(&current, &credentials.password_hash)? {
            return Err(AppError::validation("current_password", "Wrong password."));
        }
        if current == new {
            return Err(AppError::validation(
                "new_password",
                "The new password must differ from the current one.",
            ));
        }

        self.users
            .set_password_hash(user.id, &hash_password(&new)?)
            .await?;
        tracing::info!(user_id = user.id, "Password changed");
        Ok(())
    }

    pub async fn subscribe(
        &self,
        user: &User,
        author_id: i64,
        recipes_limit: Option<u32>,
    ) -> Result<Subscription, AppError> {
        let author = self.profile(author_id, Some(user)).await?.user;
        if author.id == user.id {
            return Err(AppError::validation("author", "You cannot subscribe to yourself."));
        }
        if !self.subscriptions.subscribe(user.id, author.id).await? {
            return Err(AppError::validation(
                "author",
                "You are already subscribed to this author.",
            ));
        }
        tracing::info!(user_id = user.id, author_id = author.id, "Subscribed");
        self.subscription_for(author, recipes_limit).await
    }

    pub async fn unsubscribe(&self, user: &User, author_id: i64) -> Result<(), AppError> {
        let author = self.profile(author_id, Some(user)).await?.user;
        if author.id == user.id {
            return Err(AppError::validation(
                "author",
                "You cannot unsubscribe from yourself.",
            ));
        }
        if !self.subscriptions.unsubscribe(user.id, author.id).await? {
            return Err(AppError::validation(
                "author",
                "You are not subscribed to this author.",
            ));
        }
        tracing::info!(user_id = user.id, author_id = author.id, "Unsubscribed");
        Ok(())
    }

    pub async fn subscriptions(
        &self,
        user: &User,
        page: PageRequest,
        recipes_limit: Option<u32>,
    ) -> Result<Page<Subscription>, AppError> {
        let authors = self.subscriptions.subscribed_authors(user.id, page).await?;
        let mut items = Vec::with_capacity(authors.items.len());
        for author in authors.items {
            items.push(self.subscription_for(author, recipes_limit).await?);
        }
        Ok(Page {
            items,
            total: authors.total,
        })
    }

    async fn subscription_for(
        &self,
        author: User,
        recipes_limit: Option<u32>,
    ) -> Result<Subscription, AppError> {
        let recipes = self
            .subscriptions
            .author_recipes(author.id, recipes_limit)
            .await?;
        let recipes_count = self.subscriptions.count_author_recipes(author.id).await?;
        Ok(Subscription {
            author,
            is_subscribed: true,
            recipes,
            recipes_count,
        })
    }
}
