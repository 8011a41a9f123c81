use anyhow::{bail, Context, Result};
use blogicum_client::error::BlogClientError;
use blogicum_client::models::{
    AdminPostFilter, AdminPostUpdate, CategoryUpdate, LocationUpdate, NewCategory, NewLocation,
    PostForm, ProfileForm, RegisterRequest,
};
use blogicum_client::BlogClient;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod output;
mod token;

use token::TokenManager;

#[derive(Debug, Parser)]
#[command(author, version, about = "Blogicum CLI - интерфейс командной строки для блога", long_about = None)]
struct Cli {
    #[arg(short, long, env = "BLOGICUM_SERVER", default_value = "http://localhost:3000")]
    server: String,

    #[arg(long, env = "BLOGICUM_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },

    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Show the saved token
    Status,

    /// Forget the saved token
    Logout,

    /// Home feed
    Feed {
        #[arg(short, long)]
        page: Option<String>,

        /// `-pub_date` (newest first) or `id`
        #[arg(short, long)]
        order: Option<String>,
    },

    /// Posts of one category
    Category {
        slug: String,

        #[arg(short, long)]
        page: Option<String>,
    },

    /// A user's profile and posts
    Profile {
        username: String,

        #[arg(short, long)]
        page: Option<String>,
    },

    /// A post with its comments
    Show { id: i64 },

    Create {
        #[command(flatten)]
        post: PostArgs,
    },

    /// Edit a post; omitted fields keep their value
    Edit {
        id: i64,

        #[command(flatten)]
        changes: PostChanges,
    },

    Delete { id: i64 },

    Comment {
        post_id: i64,

        #[arg(short, long)]
        text: String,
    },

    EditComment {
        post_id: i64,
        comment_id: i64,

        #[arg(short, long)]
        text: String,
    },

    DeleteComment { post_id: i64, comment_id: i64 },

    /// Edit your profile; omitted fields keep their value
    EditProfile {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Staff backoffice
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Debug, Args)]
struct PostArgs {
    #[arg(short, long)]
    title: String,

    #[arg(long)]
    text: String,

    /// Category id
    #[arg(short, long)]
    category: i64,

    /// Location id
    #[arg(short, long)]
    location: Option<i64>,

    /// RFC 3339; a future date schedules the post. Defaults to now.
    #[arg(long, value_parser = parse_datetime)]
    pub_date: Option<DateTime<Utc>>,

    /// Image file name
    #[arg(long)]
    image: Option<String>,

    /// Save without publishing
    #[arg(long)]
    draft: bool,
}

impl PostArgs {
    fn into_form(self) -> PostForm {
        PostForm {
            title: self.title,
            text: self.text,
            pub_date: Some(self.pub_date.unwrap_or_else(Utc::now)),
            location_id: self.location,
            category_id: Some(self.category),
            image: self.image,
            clear_image: false,
            is_published: !self.draft,
        }
    }
}

#[derive(Debug, Args)]
struct PostChanges {
    #[arg(short, long)]
    title: Option<String>,

    #[arg(long)]
    text: Option<String>,

    #[arg(short, long)]
    category: Option<i64>,

    #[arg(short, long)]
    location: Option<i64>,

    #[arg(long, value_parser = parse_datetime)]
    pub_date: Option<DateTime<Utc>>,

    #[arg(long, conflicts_with = "clear_image")]
    image: Option<String>,

    /// Remove the post's image
    #[arg(long)]
    clear_image: bool,

    #[arg(long)]
    published: Option<bool>,
}

impl PostChanges {
    fn apply(self, form: &mut PostForm) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(text) = self.text {
            form.text = text;
        }
        if let Some(category) = self.category {
            form.category_id = Some(category);
        }
        if let Some(location) = self.location {
            form.location_id = Some(location);
        }
        if let Some(pub_date) = self.pub_date {
            form.pub_date = Some(pub_date);
        }
        if let Some(published) = self.published {
            form.is_published = published;
        }
        if self.clear_image {
            form.image = None;
            form.clear_image = true;
        } else if let Some(image) = self.image {
            form.image = Some(image);
        }
    }
}

#[derive(Debug, Subcommand)]
enum AdminCommands {
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },
    Posts {
        #[command(subcommand)]
        command: AdminPostCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CategoryCommands {
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        slug: String,

        #[arg(long)]
        hidden: bool,
    },
    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        slug: Option<String>,

        #[arg(long)]
        published: Option<bool>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum LocationCommands {
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        hidden: bool,
    },
    Update {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        published: Option<bool>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum AdminPostCommands {
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        published: Option<bool>,
    },
    /// Inline edit of publication flag, date, author, category or location
    Update {
        id: i64,

        #[arg(long)]
        published: Option<bool>,

        #[arg(long, value_parser = parse_datetime)]
        pub_date: Option<DateTime<Utc>>,

        #[arg(long)]
        author: Option<i64>,

        #[arg(long, conflicts_with = "no_category")]
        category: Option<i64>,

        #[arg(long)]
        no_category: bool,

        #[arg(long, conflicts_with = "no_location")]
        location: Option<i64>,

        #[arg(long)]
        no_location: bool,
    },
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 date, e.g. 2024-05-01T12:00:00Z: {}", e))
}

/// `Some(None)` clears the reference, `None` leaves it alone.
fn reference_change(id: Option<i64>, clear: bool) -> Option<Option<i64>> {
    if clear {
        Some(None)
    } else {
        id.map(Some)
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::failure(&describe(&e));
        std::process::exit(1);
    }
}

fn describe(error: &anyhow::Error) -> String {
    match error.downcast_ref::<BlogClientError>() {
        Some(BlogClientError::Unauthorized(_)) => {
            "Unauthorized. Please login first: blogicum-cli login --username <username> --password <password>".to_string()
        }
        Some(BlogClientError::Redirected(target)) => {
            format!("Only the author can do that (redirected to {})", target)
        }
        Some(BlogClientError::Validation { fields, .. }) if !fields.is_empty() => {
            let details: Vec<String> = fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
                .collect();
            format!("Invalid data. {}", details.join("; "))
        }
        _ => format!("{:#}", error),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut client = BlogClient::new(&cli.server).context("Failed to create blog client")?;

    let token_manager = TokenManager::new(cli.token_file)?;
    if let Some(token) = token_manager.load_token()? {
        client.set_token(token);
    }

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let response = client
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                    first_name,
                    last_name,
                })
                .await?;
            token_manager.save_token(&response.token)?;

            output::success("Registration successful!");
            output::field("User ID", response.user.id);
            output::field("Username", &response.user.username);
            output::field("Email", &response.user.email);
        }

        Commands::Login { username, password } => {
            let response = client.login(username, password).await?;
            token_manager.save_token(&response.token)?;

            output::success("Login successful!");
            output::field("User ID", response.user.id);
            output::field("Username", &response.user.username);
        }

        Commands::Status => {
            output::field("Server", client.base_url());
            output::field("Token file", token_manager.path().display());
            match client.get_token() {
                Some(token) => {
                    output::field("Token", format!("{}...", output::truncate(token, 20)));
                    let profile = client.profile_form().await?;
                    output::success(&format!("Logged in as {}", profile.user.username));
                }
                None => bail!("No token found. Please login first"),
            }
        }

        Commands::Logout => {
            if token_manager.clear_token()? {
                output::success("Logged out");
            } else {
                println!("   No saved token");
            }
        }

        Commands::Feed { page, order } => {
            let posts = client.home_feed(page.as_deref(), order.as_deref()).await?;
            output::page(&posts);
        }

        Commands::Category { slug, page } => {
            let feed = client.category_feed(&slug, page.as_deref()).await?;
            println!("{}", feed.category.title);
            println!("{}", feed.category.description);
            output::page(&feed.posts);
        }

        Commands::Profile { username, page } => {
            let feed = client.profile_feed(&username, page.as_deref()).await?;
            output::field("Username", &feed.profile.username);
            output::field(
                "Name",
                format!("{} {}", feed.profile.first_name, feed.profile.last_name),
            );
            output::field("Registered", feed.profile.created_at.format("%d.%m.%Y"));
            output::page(&feed.posts);
        }

        Commands::Show { id } => {
            let detail = client.post_detail(id).await?;
            output::post(&detail.post);
            output::comments(&detail.comments);
        }

        Commands::Create { post } => {
            let created = client.create_post(&post.into_form()).await?;
            output::success("Post created successfully!");
            output::field("ID", created.data.id);
            output::field("Next", &created.redirect_to);
        }

        Commands::Edit { id, changes } => {
            let mut form = client.post_form(id).await?.form;
            changes.apply(&mut form);

            let updated = client.update_post(id, &form).await?;
            output::success("Post updated successfully!");
            output::post(&updated.data);
        }

        Commands::Delete { id } => {
            let deleted = client.delete_post(id).await?;
            output::success(&format!("Post #{} deleted", id));
            output::field("Next", &deleted.redirect_to);
        }

        Commands::Comment { post_id, text } => {
            let created = client.add_comment(post_id, text).await?;
            output::success(&format!("Comment #{} added", created.data.id));
        }

        Commands::EditComment {
            post_id,
            comment_id,
            text,
        } => {
            client.update_comment(post_id, comment_id, text).await?;
            output::success(&format!("Comment #{} updated", comment_id));
        }

        Commands::DeleteComment {
            post_id,
            comment_id,
        } => {
            client.delete_comment(post_id, comment_id).await?;
            output::success(&format!("Comment #{} deleted", comment_id));
        }

        Commands::EditProfile {
            username,
            first_name,
            last_name,
            email,
        } => {
            let current = client.profile_form().await?.form;
            let form = ProfileForm {
                username: username.unwrap_or(current.username),
                first_name: first_name.unwrap_or(current.first_name),
                last_name: last_name.unwrap_or(current.last_name),
                email: email.unwrap_or(current.email),
            };

            let updated = client.update_profile(&form).await?;
            output::success("Profile updated");
            output::field("Profile", &updated.redirect_to);
        }

        Commands::Admin { command } => run_admin(&client, command).await?,
    }

    Ok(())
}

async fn run_admin(client: &BlogClient, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Categories { command } => match command {
            CategoryCommands::List { search } => {
                let listing = client.list_categories(search.as_deref()).await?;
                println!("{} ({})", listing.title, listing.count);
                listing.items.iter().for_each(output::category);
            }
            CategoryCommands::Show { id } => {
                let detail = client.category_detail(id).await?;
                println!("{}", detail.verbose_name);
                output::category(&detail.record);
                println!("   {}", detail.record.description);
                for (i, post) in detail.posts.iter().enumerate() {
                    output::post_line(i + 1, post);
                }
            }
            CategoryCommands::Create {
                title,
                description,
                slug,
                hidden,
            } => {
                let category = client
                    .create_category(&NewCategory {
                        title,
                        description,
                        slug,
                        is_published: !hidden,
                    })
                    .await?;
                output::success("Category created");
                output::category(&category);
            }
            CategoryCommands::Update {
                id,
                title,
                description,
                slug,
                published,
            } => {
                let category = client
                    .update_category(
                        id,
                        &CategoryUpdate {
                            title,
                            description,
                            slug,
                            is_published: published,
                        },
                    )
                    .await?;
                output::success("Category updated");
                output::category(&category);
            }
            CategoryCommands::Delete { id } => {
                client.delete_category(id).await?;
                output::success(&format!("Category #{} deleted", id));
            }
        },

        AdminCommands::Locations { command } => match command {
            LocationCommands::List { search } => {
                let listing = client.list_locations(search.as_deref()).await?;
                println!("{} ({})", listing.title, listing.count);
                listing.items.iter().for_each(output::location);
            }
            LocationCommands::Show { id } => {
                let detail = client.location_detail(id).await?;
                println!("{}", detail.verbose_name);
                output::location(&detail.record);
                for (i, post) in detail.posts.iter().enumerate() {
                    output::post_line(i + 1, post);
                }
            }
            LocationCommands::Create { name, hidden } => {
                let location = client
                    .create_location(&NewLocation {
                        name,
                        is_published: !hidden,
                    })
                    .await?;
                output::success("Location created");
                output::location(&location);
            }
            LocationCommands::Update {
                id,
                name,
                published,
            } => {
                let location = client
                    .update_location(
                        id,
                        &LocationUpdate {
                            name,
                            is_published: published,
                        },
                    )
                    .await?;
                output::success("Location updated");
                output::location(&location);
            }
            LocationCommands::Delete { id } => {
                client.delete_location(id).await?;
                output::success(&format!("Location #{} deleted", id));
            }
        },

        AdminCommands::Posts { command } => match command {
            AdminPostCommands::List { search, published } => {
                let listing = client
                    .list_admin_posts(&AdminPostFilter {
                        q: search,
                        is_published: published,
                        ..Default::default()
                    })
                    .await?;
                println!("{} ({})", listing.title, listing.count);
                for (i, post) in listing.items.iter().enumerate() {
                    output::post_line(i + 1, post);
                }
            }
            AdminPostCommands::Update {
                id,
                published,
                pub_date,
                author,
                category,
                no_category,
                location,
                no_location,
            } => {
                let post = client
                    .update_admin_post(
                        id,
                        &AdminPostUpdate {
                            is_published: published,
                            pub_date,
                            author_id: author,
                            category_id: reference_change(category, no_category),
                            location_id: reference_change(location, no_location),
                        },
                    )
                    .await?;
                output::success("Post updated");
                output::post_record(&post);
            }
        },
    }

    Ok(())
}
