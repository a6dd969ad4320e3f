//! Fixed system instruction sent with every trial

/// Transaction categories the document uses
pub const TRANSACTION_CATEGORIES: &[&str] = &[
    "salary",
    "freelance",
    "investments",
    "gifts",
    "refunds",
    "initial_deposit",
    "other",
    "food",
    "groceries",
    "transport",
    "housing",
    "utilities",
    "healthcare",
    "entertainment",
    "education",
    "shopping",
    "travel",
];

const DOCUMENT_SCHEMA: &str = r#"{
  "bankAccounts": [{
    "id": string,
    "name": string,
    "type": "personal" | "savings" | "retirement" | "marriage",
    "currentBalance": number,
    "currency": string,
    "transactions": [{
      "id": string,
      "amount": number,            // positive for income, negative for expenses
      "date": string,
      "category": string,
      "receiptId": string,         // optional
      "recurrentPaymentId": string, // optional
      "balance": number            // account balance after this transaction
    }],
    "recurrentPayments": [{
      "id": string,
      "amount": number,
      "name": string,
      "category": string,
      "frequency": "weekly" | "monthly" | "quarterly" | "yearly",
      "startDate": string,
      "endDate": string,           // optional
      "autoPay": boolean
    }]
  }],
  "receipts": [{
    "id": string,
    "description": string,
    "merchant": string,
    "location": { "latitude": number, "longitude": number },
    "tags": [string]               // optional
  }],
  "savingsProfiles": [{
    "id": string,
    "name": string,
    "currentAmount": number,
    "targetAmount": number,
    "startDate": string,
    "targetDate": string,          // optional
    "category": string
  }]
}"#;

/// Build the system instruction: document schema plus output-format rules.
pub fn system_instruction() -> String {
    format!(
        "You will need to query a JSON file using JMESPath to get the result. \
The JSON follows this structure:\n```\n{}\n```\n\n\
All dates are ISO strings.\n\
The transaction category can be one of the following: {}\n\n\
Only output the JMESPath expression that gets the result the user wants. \
Do not output any other text or explanations.",
        DOCUMENT_SCHEMA,
        TRANSACTION_CATEGORIES.join(", ")
    )
}
