use blogicum_client::models::{Category, Comment, Location, Page, Post, PostRecord};
use colored::Colorize;

pub fn success(message: &str) {
    println!("{} {}", "✅".green(), message.green());
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

pub fn field(name: &str, value: impl std::fmt::Display) {
    println!("   {}: {}", name.bold(), value);
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn flag(is_published: bool) -> colored::ColoredString {
    if is_published {
        "published".green()
    } else {
        "hidden".yellow()
    }
}

pub fn post_line(index: usize, post: &Post) {
    println!(
        "   {}. [{}] {} {}",
        index,
        post.id,
        post.title.bold(),
        format!("by {}", post.author.username).dimmed()
    );
    println!(
        "      {} | {} | comments: {}",
        post.pub_date.format("%d.%m.%Y %H:%M"),
        post.category
            .as_ref()
            .map(|c| c.title.as_str())
            .unwrap_or("no category"),
        post.comment_count
    );
    println!("      {}", truncate(&post.text, 60));
}

pub fn page(page: &Page<Post>) {
    println!(
        "{}",
        format!(
            "Page {} of {} ({} posts)",
            page.page, page.num_pages, page.total
        )
        .cyan()
    );
    if page.items.is_empty() {
        println!("   No posts found");
        return;
    }
    let offset = ((page.page - 1) * page.per_page) as usize;
    for (i, post) in page.items.iter().enumerate() {
        post_line(offset + i + 1, post);
    }
    if page.has_next {
        println!("   {}", format!("next: --page {}", page.page + 1).dimmed());
    }
}

pub fn post(post: &Post) {
    println!("{}", post.title.bold().underline());
    field("ID", post.id);
    field("Author", &post.author.username);
    field("Published", post.pub_date.format("%d.%m.%Y %H:%M"));
    field("Status", flag(post.is_published));
    if let Some(category) = &post.category {
        field("Category", format!("{} ({})", category.title, category.slug));
    }
    if let Some(location) = &post.location {
        field("Location", &location.name);
    }
    if let Some(image) = &post.image {
        field("Image", image);
    }
    println!();
    println!("{}", post.text);
}

pub fn post_record(post: &PostRecord) {
    field("ID", post.id);
    field("Title", &post.title);
    field("Status", flag(post.is_published));
    field("Published", post.pub_date.format("%d.%m.%Y %H:%M"));
}

pub fn comments(comments: &[Comment]) {
    println!();
    println!("{}", format!("Comments ({})", comments.len()).cyan());
    for comment in comments {
        println!(
            "   [{}] {} {}",
            comment.id,
            comment.author.username.bold(),
            comment.created_at.format("%d.%m.%Y %H:%M").to_string().dimmed()
        );
        println!("      {}", comment.text);
    }
}

pub fn category(category: &Category) {
    println!(
        "   [{}] {} ({}) {}",
        category.id,
        category.title.bold(),
        category.slug,
        flag(category.is_published)
    );
}

pub fn location(location: &Location) {
    println!(
        "   [{}] {} {}",
        location.id,
        location.name.bold(),
        flag(location.is_published)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("Привет", 10), "Привет");
        assert_eq!(truncate("Привет, мир", 6), "Привет...");
    }
}
