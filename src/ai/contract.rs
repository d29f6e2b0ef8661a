//! Service-agreement drafting.
//!
//! Asks the reasoning service for a concise plain-text agreement; on any
//! failure, falls back to a fixed template interpolated with the same
//! fields so the caller always receives a non-empty document body.

use chrono::{NaiveDate, Utc};
use tracing::warn;

use super::ReasoningClient;

/// The agency is always the providing party.
pub const PROVIDER_NAME: &str = "Vaisptech Solutions";

const SYSTEM_PROMPT: &str = "You are a legal expert specializing in software development contracts.\n\
    Draft a professional Service Agreement based on the provided details.\n\
    The contract should include:\n\
    1. Header with \"Service Agreement\".\n\
    2. Parties involved (Vaisptech Solutions and the Client).\n\
    3. Project Scope.\n\
    4. Commercial terms (Budget).\n\
    5. Timeline (Completion Date).\n\
    6. Standard confidentiality and extensive legal terms are NOT required, keep it concise but professional.\n\n\
    Format the output as plain text suitable for a PDF.";

#[derive(Debug, Clone)]
pub struct ContractInput {
    pub client_name: String,
    pub project_name: String,
    pub scope: String,
    pub budget: String,
    pub estimated_date: String,
}

/// Draft an agreement. Never fails: a failed completion yields the
/// interpolated template instead.
pub async fn draft(client: &ReasoningClient, input: &ContractInput) -> String {
    match client
        .complete(SYSTEM_PROMPT, &user_prompt(input), false)
        .await
    {
        Ok(content) => content,
        Err(err) => {
            warn!(err = %err, "contract drafting failed — returning template agreement");
            template(input, Utc::now().date_naive())
        }
    }
}

fn user_prompt(input: &ContractInput) -> String {
    format!(
        "Client: {}\nProject: {}\nScope: {}\nBudget: ${}\nEst. Completion: {}",
        input.client_name, input.project_name, input.scope, input.budget, input.estimated_date
    )
}

fn template(input: &ContractInput, signed: NaiveDate) -> String {
    format!(
        "SERVICE AGREEMENT\n\
        \n\
        This Service Agreement (\"Agreement\") is entered into by and between:\n\
        \n\
        PROVIDER: {provider}, a technology agency (\"Provider\").\n\
        CLIENT: {client} (\"Client\").\n\
        \n\
        1. ENGAGEMENT\n\
        Provider agrees to perform the services described in the Project Scope below for the Client.\n\
        \n\
        2. PROJECT NAME\n\
        {project}\n\
        \n\
        3. SCOPE OF WORK\n\
        Provider shall deliver the following services:\n\
        {scope}\n\
        \n\
        4. FINANCIAL TERMS\n\
        Total Project Budget: ${budget}\n\
        Payment Terms: 50% deposit required to commence work, with the remaining balance due upon completion/delivery.\n\
        \n\
        5. TIMELINE\n\
        Estimated Completion Date: {date}\n\
        The Provider will make reasonable efforts to meet this deadline, subject to the Client's timely provision of necessary resources and feedback.\n\
        \n\
        6. CONFIDENTIALITY\n\
        Each party shall treat all confidential information received from the other party as strictly confidential and shall not disclose such information to any third party without prior written consent.\n\
        \n\
        7. INTELLECTUAL PROPERTY\n\
        Upon full payment of the Budget, Provider assigns to Client all right, title, and interest in the deliverables created specifically for Client under this Agreement.\n\
        \n\
        IN WITNESS WHEREOF, the parties have caused this Agreement to be executed by their duly authorized representatives.\n\
        \n\
        __________________________                  __________________________\n\
        {provider}                         {client}\n\
        Date: {signed}                        Date: ____________________",
        provider = PROVIDER_NAME,
        client = input.client_name,
        project = input.project_name,
        scope = input.scope,
        budget = input.budget,
        date = input.estimated_date,
        signed = signed.format("%Y-%m-%d"),
    )
}
