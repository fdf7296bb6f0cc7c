//! Prompt construction for the ranking call. The catalog is embedded as
//! pretty-printed JSON; retries prepend a strict-JSON warning block because
//! the usual failure mode is markdown-wrapped or chatty output.

use serde::Serialize;

use crate::workflows::affordability::FinancialProfile;

use super::catalog::Vehicle;

#[derive(Serialize)]
struct PromptVehicle<'a> {
    year: u16,
    make: &'a str,
    model: &'a str,
    trim: &'a str,
    msrp_usd_est: f64,
    horsepower_hp: u32,
    body_style: &'a str,
    powertrain: &'a str,
    drivetrain: &'a str,
    image_url: &'a str,
}

pub(crate) fn build_ranking_prompt(
    vehicles: &[Vehicle],
    profile: &FinancialProfile,
    tax_rate: f64,
    is_retry: bool,
) -> Result<String, serde_json::Error> {
    let entries: Vec<PromptVehicle<'_>> = vehicles
        .iter()
        .map(|vehicle| PromptVehicle {
            year: vehicle.year,
            make: &vehicle.make,
            model: &vehicle.model,
            trim: &vehicle.trim,
            msrp_usd_est: vehicle.msrp_usd_est,
            horsepower_hp: vehicle.horsepower_hp.unwrap_or(0),
            body_style: &vehicle.body_style,
            powertrain: &vehicle.powertrain,
            drivetrain: &vehicle.drivetrain,
            image_url: &vehicle.image_url,
        })
        .collect();

    let catalog_json = serde_json::to_string_pretty(&entries)?;

    let retry_instructions = if is_retry {
        "\n\nIMPORTANT: Your previous response had an invalid JSON format. Please ensure:\n\
         - Return ONLY valid JSON, no markdown, no explanations, no code blocks\n\
         - Use the exact structure specified below\n\
         - Include all vehicles from the input array\n"
    } else {
        ""
    };

    Ok(format!(
        "You are an auto-financing AI advisor. Your task is to intelligently rank vehicles for a customer based on their financial profile.\n\
         \n\
         CUSTOMER FINANCIAL PROFILE:\n\
         - Annual Income: ${income:.0}\n\
         - Credit Score: {credit}\n\
         - Available Monthly Payment: ${available:.0}\n\
         - Sales Tax Rate: {tax:.2}%\n\
         \n\
         APR RATES (based on credit score):\n\
         - 750+: 3.99% (Excellent)\n\
         - 700-749: 5.49% (Very Good)\n\
         - 650-699: 7.99% (Good)\n\
         - 600-649: 11.99% (Fair)\n\
         \n\
         AVAILABLE VEHICLES (JSON format):\n\
         {catalog}\n\
         \n\
         YOUR TASK:\n\
         Rank these vehicles in order of recommendation for this customer. Follow these rules strictly:\n\
         \n\
         1. AFFORDABILITY PATTERN: For every 3 vehicles, 2 should be AFFORDABLE and 1 should be a STRETCH.\n\
            - AFFORDABLE: Monthly payment (60-month loan) is <= 70% of available monthly payment\n\
            - STRETCH: Monthly payment is 70-95% of available monthly payment (challenging but possible)\n\
         \n\
         2. Calculate estimated monthly payments using:\n\
            - Total Price = MSRP x (1 + tax_rate/100)\n\
            - Down Payment = 10% of total price\n\
            - Financed Amount = Total Price - Down Payment\n\
            - Monthly Payment = Standard loan formula with 60 months and appropriate APR\n\
         \n\
         3. Consider:\n\
            - Value proposition (features, fuel efficiency, practicality)\n\
            - Popular models that hold value\n\
            - Mix of vehicle types (sedans, SUVs, trucks)\n\
            - Customer's likely preferences based on income level\n\
         \n\
         4. Pattern examples:\n\
            [Affordable, Affordable, Stretch, Affordable, Affordable, Stretch, ...]{retry}\n\
         \n\
         RESPONSE FORMAT:\n\
         Return ONLY a valid JSON object with this exact structure (no markdown, no extra text):\n\
         \n\
         {{\n\
           \"ranked_vehicles\": [\n\
             {{\n\
               \"year\": 2025,\n\
               \"make\": \"Toyota\",\n\
               \"model\": \"Camry\",\n\
               \"trim\": \"LE\",\n\
               \"reason\": \"Affordable hybrid with excellent value\",\n\
               \"category\": \"affordable\"\n\
             }},\n\
             {{\n\
               \"year\": 2025,\n\
               \"make\": \"Toyota\",\n\
               \"model\": \"Highlander\",\n\
               \"trim\": \"LE\",\n\
               \"reason\": \"Premium SUV, stretch but achievable\",\n\
               \"category\": \"stretch\"\n\
             }}\n\
           ]\n\
         }}\n\
         \n\
         IMPORTANT:\n\
         - Include ALL vehicles from the input\n\
         - Use \"category\" field: either \"affordable\" or \"stretch\"\n\
         - Maintain the 2:1 ratio (approximately 2 affordable for every 1 stretch)\n\
         - year, make, model, and trim must EXACTLY match the input vehicles\n\
         - Return ONLY the JSON object, nothing else",
        income = profile.annual_income,
        credit = profile.credit_score,
        available = profile.available_monthly,
        tax = tax_rate,
        catalog = catalog_json,
        retry = retry_instructions,
    ))
}
