use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn home_page() -> Markup {
    desktop_layout(
        "EstateHub",
        false,
        html! {
            main class="container" {
                h1 { "EstateHub" }
                p { "Your marketplace assistant: chat leads, listings, and role-based automations in one place." }

                section class="card" {
                    h3 { "What it does" }
                    ul {
                        li { "Turns closing conversations into tracked leads" }
                        li { "Keeps your unread notifications in one badge" }
                        li { "Runs the busywork: responses, reminders, screening" }
                    }
                }

                p { a href="/dashboard" { "Go to your dashboard" } }
            }
        },
    )
}
