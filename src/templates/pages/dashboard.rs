use crate::automation::TaskId;
use crate::db::leads::{LeadRow, LeadStats};
use crate::templates::components::card;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub struct DashboardVm {
    pub name: String,
    pub role: String,
    pub is_admin: bool,
    pub stats: LeadStats,
    pub unread_count: i64,
    pub tasks: &'static [TaskId],
    pub recent_leads: Vec<LeadRow>,
    pub now: i64,
}

fn time_ago(ts: i64, now: i64) -> String {
    let seconds = (now - ts).max(0);
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}

pub fn dashboard_page(vm: &DashboardVm) -> Markup {
    desktop_layout(
        "Dashboard",
        vm.is_admin,
        html! {
            main class="container" {
                h1 { "Dashboard" }
                p {
                    "Signed in as " strong { (vm.name) } " (" (vm.role) ")"
                    @if vm.unread_count > 0 {
                        span class="badge" { (vm.unread_count) " unread" }
                    }
                }

                (card("Your leads", html! {
                    p { "Total: " strong { (vm.stats.total) } }
                    ul {
                        @for (status, n) in &vm.stats.by_status {
                            li { (status.as_str()) ": " (n) }
                        }
                    }
                    p { "Closed this month: " strong { (vm.stats.closed_this_month) } }
                    p { a href="/api/leads/export.xlsx" { "Download report (xlsx)" } }
                }))

                (card("Recent leads", html! {
                    @if vm.recent_leads.is_empty() {
                        p { "No leads yet — captured conversations will show up here." }
                    } @else {
                        table {
                            thead {
                                tr { th { "Client" } th { "Deal" } th { "Status" } th { "Property" } th { "When" } }
                            }
                            tbody {
                                @for lead in &vm.recent_leads {
                                    tr {
                                        td { (lead.client.name) }
                                        td { (lead.deal_type.as_str()) }
                                        td { (lead.status.as_str()) }
                                        td {
                                            @match &lead.listing {
                                                Some(listing) => { (listing.title) }
                                                None => { em { "listing unavailable" } }
                                            }
                                        }
                                        td { (time_ago(lead.created_at, vm.now)) }
                                    }
                                }
                            }
                        }
                    }
                }))

                (card("Automations", html! {
                    @if vm.tasks.is_empty() {
                        p { "No automations for your role." }
                    } @else {
                        ul {
                            @for task in vm.tasks {
                                li { (task.label()) " (" code { (task.as_str()) } ")" }
                            }
                        }
                    }
                }))
            }
        },
    )
}
