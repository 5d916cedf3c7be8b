use crate::entities::{Category, FeedSeed};

/// Static feed catalog merged into the repository at startup (insert-if-absent by name).
pub fn feed_catalog() -> Vec<FeedSeed> {
    vec![
        FeedSeed {
            name: "Vnexpress",
            url: "https://vnexpress.net/rss/tin-moi-nhat.rss",
            category: Category::VietnameseNews,
        },
        FeedSeed {
            name: "Tuoitre",
            url: "https://tuoitre.vn/rss/tin-moi-nhat.rss",
            category: Category::VietnameseNews,
        },
        FeedSeed {
            name: "Kenh14",
            url: "https://kenh14.vn/rss/home.rss",
            category: Category::VietnameseNews,
        },
        FeedSeed {
            name: "TechCrunch",
            url: "https://techcrunch.com/feed/",
            category: Category::Tech,
        },
        FeedSeed {
            name: "The Verge",
            url: "https://www.theverge.com/rss/index.xml",
            category: Category::Tech,
        },
        FeedSeed {
            name: "Engadget",
            url: "https://www.engadget.com/rss.xml",
            category: Category::Tech,
        },
        FeedSeed {
            name: "CNBC",
            url: "https://www.cnbc.com/id/100003114/device/rss/rss.html",
            category: Category::UsNews,
        },
        FeedSeed {
            name: "NBC News",
            url: "https://feeds.nbcnews.com/nbcnews/public/news",
            category: Category::UsNews,
        },
        FeedSeed {
            name: "ABC News",
            url: "https://abcnews.go.com/abcnews/usheadlines",
            category: Category::UsNews,
        },
        FeedSeed {
            name: "BBC News",
            url: "https://feeds.bbci.co.uk/news/rss.xml",
            category: Category::GlobalNews,
        },
        FeedSeed {
            name: "CNBC Global",
            url: "https://www.cnbc.com/id/100727362/device/rss/rss.html",
            category: Category::GlobalNews,
        },
        FeedSeed {
            name: "CBSNews",
            url: "https://www.cbsnews.com/latest/rss/world",
            category: Category::GlobalNews,
        },
    ]
}
