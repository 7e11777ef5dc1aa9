// src/automation/tasks.rs
//
// One handler per automation task. Each works against the caller-supplied
// payload only (mock data in demos, real records in production) and
// reports what it did as ordered, human-readable actions. Handlers return
// Err(reason) for unusable payloads; the executor turns that into a
// `{success: false}` result.

use serde_json::Value;

use crate::automation::executor::AutomationResult;

fn field<'a>(payload: &'a Value, key: &str) -> Result<&'a Value, String> {
    payload
        .get(key)
        .ok_or_else(|| format!("payload missing '{key}'"))
}

fn str_field<'a>(obj: &'a Value, key: &str) -> Result<&'a str, String> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("payload missing '{key}'"))
}

fn num_field(obj: &Value, key: &str) -> Result<f64, String> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("payload missing '{key}'"))
}

fn array_field<'a>(payload: &'a Value, key: &str) -> Result<&'a Vec<Value>, String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("payload missing '{key}'"))
}

fn ok(message: impl Into<String>, actions: Vec<String>) -> Result<AutomationResult, String> {
    Ok(AutomationResult {
        success: true,
        message: message.into(),
        actions,
    })
}

// ---- Agent tasks ----------------------------------------------------------

pub fn auto_respond(payload: &Value) -> Result<AutomationResult, String> {
    let inquiry = field(payload, "inquiry")?;
    let email = str_field(inquiry, "email")?;
    let message = str_field(inquiry, "message")?;
    let property = inquiry
        .get("propertyTitle")
        .and_then(Value::as_str)
        .unwrap_or("the property");

    let actions = vec![
        format!("Drafted a personalized reply about {property}"),
        format!("Quoted the client's question: \"{message}\""),
        format!("Queued the response for delivery to {email}"),
        "Flagged the thread for a 48h follow-up check".to_string(),
    ];
    ok(format!("Responded to the inquiry from {email}"), actions)
}

pub fn auto_schedule(payload: &Value) -> Result<AutomationResult, String> {
    let prefs = field(payload, "preferences")?;
    let days = array_field(prefs, "days")?;
    let times = array_field(prefs, "times")?;

    if days.is_empty() || times.is_empty() {
        return Err("no scheduling preferences supplied".to_string());
    }

    let mut actions = Vec::new();
    for day in days {
        for time in times {
            let (Some(day), Some(time)) = (day.as_str(), time.as_str()) else {
                continue;
            };
            actions.push(format!("Proposed viewing slot: {day} at {time}"));
        }
    }
    if actions.is_empty() {
        return Err("scheduling preferences were not readable".to_string());
    }
    actions.push("Sent the slot options to the client for confirmation".to_string());

    ok(
        format!("Proposed {} viewing slots", actions.len() - 1),
        actions,
    )
}

pub fn auto_marketing(payload: &Value) -> Result<AutomationResult, String> {
    let listing = field(payload, "listing")?;
    let title = str_field(listing, "title")?;
    let location = listing
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or("a prime location");
    let price = listing.get("price").and_then(Value::as_str);

    let mut actions = vec![
        format!("Wrote a listing headline for \"{title}\""),
        format!("Drafted a description highlighting {location}"),
    ];
    if let Some(price) = price {
        actions.push(format!("Added a pricing call-out at {price}"));
    }
    actions.push("Prepared social posts in three formats".to_string());

    ok(format!("Generated marketing copy for {title}"), actions)
}

pub fn auto_followup(payload: &Value) -> Result<AutomationResult, String> {
    let leads = payload
        .get("leads")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut actions = vec![format!("Scanned {} open lead(s) for stale contact", leads.len())];
    for lead in &leads {
        let name = lead
            .get("clientName")
            .and_then(Value::as_str)
            .unwrap_or("a client");
        actions.push(format!("Scheduled a follow-up message for {name}"));
    }

    let message = if leads.is_empty() {
        "No leads currently need a follow-up".to_string()
    } else {
        format!("Scheduled follow-ups for {} lead(s)", leads.len())
    };
    ok(message, actions)
}

// ---- Landlord tasks -------------------------------------------------------

pub fn auto_rent_reminder(payload: &Value) -> Result<AutomationResult, String> {
    let tenants = array_field(payload, "tenants")?;
    if tenants.is_empty() {
        return ok(
            "No rent reminders due",
            vec!["Checked the tenant roster: nothing due".to_string()],
        );
    }

    let mut actions = Vec::new();
    for tenant in tenants {
        let name = str_field(tenant, "name")?;
        let unit = str_field(tenant, "unit")?;
        let due = tenant
            .get("rentDueDate")
            .and_then(Value::as_str)
            .unwrap_or("the due date");
        actions.push(format!("Queued rent reminder for {name} (unit {unit}), due {due}"));
    }

    ok(
        format!("Sent rent reminders to {} tenant(s)", tenants.len()),
        actions,
    )
}

pub fn auto_screen(payload: &Value) -> Result<AutomationResult, String> {
    let application = field(payload, "application")?;
    let name = str_field(application, "name")?;
    let income = num_field(application, "income")?;
    let credit_score = num_field(application, "creditScore")?;

    let recommendation = if credit_score >= 680.0 && income >= 100_000.0 {
        "recommend approval"
    } else if credit_score >= 620.0 {
        "recommend approval with an increased deposit"
    } else {
        "recommend declining"
    };

    let actions = vec![
        format!("Verified stated income of {income:.0} for {name}"),
        format!("Pulled credit profile: score {credit_score:.0}"),
        format!("Screening outcome: {recommendation}"),
    ];
    ok(format!("Screened application from {name}"), actions)
}

pub fn auto_maintenance(payload: &Value) -> Result<AutomationResult, String> {
    let request = field(payload, "request")?;
    let description = str_field(request, "description")?;
    let unit = str_field(request, "unit")?;
    let category = route_category(description);

    let actions = vec![
        format!("Logged maintenance request for unit {unit}"),
        format!("Categorized issue as {category}"),
        format!("Requested availability from the preferred {category} vendor"),
        "Proposed a service window within 3 business days".to_string(),
    ];
    ok(format!("Scheduled maintenance for unit {unit}"), actions)
}

// ---- Property Owner tasks -------------------------------------------------

pub fn auto_pricing(payload: &Value) -> Result<AutomationResult, String> {
    let listing = field(payload, "listing")?;
    let title = str_field(listing, "title")?;
    let price = str_field(listing, "price")?;

    let mut actions = vec![
        format!("Reviewed current asking price of {price} for \"{title}\""),
        "Compared against recent closings in the area".to_string(),
    ];
    match parse_amount(price) {
        Some(amount) => {
            let suggested = amount * 97 / 100;
            actions.push(format!(
                "Suggested a competitive price of {} (3% under asking)",
                format_thousands(suggested)
            ));
        }
        None => {
            actions.push("Asking price is not numeric; flagged for manual review".to_string());
        }
    }

    ok(format!("Priced \"{title}\" against the market"), actions)
}

pub fn auto_analysis(payload: &Value) -> Result<AutomationResult, String> {
    let properties = array_field(payload, "properties")?;
    if properties.is_empty() {
        return Err("no properties to analyze".to_string());
    }

    let mut actions = vec![format!("Compared {} properties", properties.len())];
    for p in properties {
        let title = str_field(p, "title")?;
        let price = p.get("price").and_then(Value::as_str).unwrap_or("unlisted");
        actions.push(format!("{title}: listed at {price}"));
    }
    actions.push("Summarized demand and price trend for the segment".to_string());

    ok(
        format!("Analyzed {} compatible properties", properties.len()),
        actions,
    )
}

pub fn auto_optimize(payload: &Value) -> Result<AutomationResult, String> {
    let listing = field(payload, "listing")?;
    let title = str_field(listing, "title")?;
    let description = listing
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("");
    let image_count = listing
        .get("imageUrls")
        .and_then(Value::as_array)
        .map(|a| a.len())
        .unwrap_or(0);

    let mut actions = Vec::new();
    if title.len() < 30 {
        actions.push("Suggested a longer, more descriptive headline".to_string());
    }
    if description.len() < 100 {
        actions.push("Expanded the description with neighborhood details".to_string());
    }
    if image_count < 5 {
        actions.push(format!(
            "Recommended adding photos ({image_count} uploaded, 5+ perform best)"
        ));
    }
    if actions.is_empty() {
        actions.push("Listing already follows best practices".to_string());
    }

    ok(
        format!("Generated {} optimization suggestion(s)", actions.len()),
        actions,
    )
}

// ---- Tenant tasks ---------------------------------------------------------

pub fn auto_maintenance_route(payload: &Value) -> Result<AutomationResult, String> {
    let request = field(payload, "request")?;
    let description = str_field(request, "description")?;
    let unit = str_field(request, "unit")?;
    let category = route_category(description);

    let actions = vec![
        format!("Filed maintenance ticket for unit {unit}"),
        format!("Categorized issue as {category}"),
        format!("Routed to the on-call {category} technician"),
        "Sent the tenant a ticket confirmation".to_string(),
    ];
    ok(format!("Submitted maintenance request for unit {unit}"), actions)
}

pub fn auto_payment_reminder(payload: &Value) -> Result<AutomationResult, String> {
    let due_date = str_field(payload, "dueDate")?;
    let amount = str_field(payload, "amount")?;

    let actions = vec![
        format!("Scheduled a payment reminder 3 days before {due_date}"),
        format!("Reminder amount set to {amount}"),
        "Enabled a same-day confirmation once payment clears".to_string(),
    ];
    ok(format!("Payment reminder set for {due_date}"), actions)
}

// ---- shared helpers -------------------------------------------------------

/// Keyword routing for maintenance descriptions.
fn route_category(description: &str) -> &'static str {
    let d = description.to_lowercase();
    if ["leak", "pipe", "water", "drain", "toilet"].iter().any(|k| d.contains(k)) {
        "Plumbing"
    } else if ["ac", "heat", "hvac", "air con", "thermostat"].iter().any(|k| d.contains(k)) {
        "HVAC"
    } else if ["power", "light", "outlet", "electric", "wiring"].iter().any(|k| d.contains(k)) {
        "Electrical"
    } else if ["fridge", "oven", "washer", "dryer", "appliance"].iter().any(|k| d.contains(k)) {
        "Appliance"
    } else {
        "General"
    }
}

/// Pull the digits out of a display price like "12,000,000 KSh".
fn parse_amount(price: &str) -> Option<i64> {
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn format_thousands(amount: i64) -> String {
    let raw = amount.to_string();
    let mut out = String::new();
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
