// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde_json::json;

use m3u_iptv::PlaylistClient;
use m3u_iptv::playlist::{Category, Entry, Playlist};

use super::{CommandContext, OutputFormat};

/// Download a provider's playlist and print it, or a summary of it.
pub struct FetchCommand {
    pub category: Option<Category>,
    pub format: OutputFormat,
    pub limit: Option<usize>,
}

impl FetchCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let (credentials, provider_name) = context.credentials()?;
        eprintln!("Fetching from {}...", provider_name);

        let mut client = PlaylistClient::new(&context.config.network)?;
        client.enable_progress();
        let playlist = client.fetch_playlist(&credentials).await?;

        match self.category {
            Some(category) => self.print_category(&playlist, category)?,
            None if self.format == OutputFormat::Text => Self::print_summary(&playlist),
            None => {
                let entries: Vec<(Category, &Entry)> = Category::ALL
                    .iter()
                    .flat_map(|c| playlist.entries(*c).iter().map(move |e| (*c, e)))
                    .take(self.limit.unwrap_or(usize::MAX))
                    .collect();
                self.print_entries(&entries)?;
            }
        }

        Ok(())
    }

    fn print_summary(playlist: &Playlist) {
        println!("Playlist loaded. {} items found.", playlist.total());
        for category in Category::ALL {
            println!("  {:10} {}", category.to_string(), playlist.entries(category).len());
        }
    }

    fn print_category(&self, playlist: &Playlist, category: Category) -> Result<()> {
        let entries: Vec<(Category, &Entry)> = playlist
            .entries(category)
            .iter()
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|e| (category, e))
            .collect();

        if entries.is_empty() && self.format == OutputFormat::Text {
            println!("{}: no items found.", category);
            return Ok(());
        }

        self.print_entries(&entries)
    }

    fn print_entries(&self, entries: &[(Category, &Entry)]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let results: Vec<_> = entries
                    .iter()
                    .map(|(category, entry)| {
                        json!({
                            "title": entry.title,
                            "group": entry.group,
                            "logo": entry.logo,
                            "url": entry.stream_url,
                            "category": category.as_str(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            OutputFormat::Text => {
                for (_, entry) in entries {
                    println!("{:30} | {}", entry.group, entry.title);
                }
            }
            OutputFormat::M3u => {
                println!("#EXTM3U");
                for (_, entry) in entries {
                    print!("{}", m3u_entry(entry));
                }
            }
        }

        Ok(())
    }
}

fn m3u_entry(entry: &Entry) -> String {
    let mut attributes = format!("tvg-name=\"{}\"", entry.title.replace('"', "'"));
    if !entry.logo.is_empty() {
        attributes.push_str(&format!(" tvg-logo=\"{}\"", entry.logo));
    }
    attributes.push_str(&format!(" group-title=\"{}\"", entry.group.replace('"', "'")));

    format!(
        "#EXTINF:-1 {},{}\n{}\n",
        attributes, entry.title, entry.stream_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use m3u_iptv::playlist::parse_m3u;

    #[test]
    fn test_m3u_entry_reparses() {
        let entry = Entry {
            title: "Globo HD".to_string(),
            group: "Canais | Abertos".to_string(),
            logo: "http://logo/globo.png".to_string(),
            stream_url: "http://server/live/1.ts".to_string(),
        };

        let text = format!("#EXTM3U\n{}", m3u_entry(&entry));
        let playlist = parse_m3u(&text);
        assert_eq!(playlist.channels, vec![entry]);
    }
}
