// db/seed.rs
// Built-in starter taxonomy so a fresh database can classify end to end
//
// Keywords and topics use the singular, lowercase forms produced by context
// extraction. Multi-word keywords are matched as phrases.

use anyhow::Result;
use bizclass_types::CodeType;
use rusqlite::{Connection, params};
use tracing::info;

use CodeType::{Mcc, Naics, Sic};

struct IndustrySeed {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    /// (keyword, weight)
    keywords: &'static [(&'static str, f64)],
    /// (topic, relevance, accuracy)
    topics: &'static [(&'static str, f64, f64)],
    /// (keyword, entity, strength)
    patterns: &'static [(&'static str, &'static str, f64)],
    /// (type, code, description, relevance)
    codes: &'static [(CodeType, &'static str, &'static str, f64)],
}

const INDUSTRIES: &[IndustrySeed] = &[
    IndustrySeed {
        name: "Restaurants",
        category: "Food Service",
        description: "Full and limited service eating places",
        keywords: &[
            ("restaurant", 0.95),
            ("pizza", 0.9),
            ("pizzeria", 0.95),
            ("diner", 0.9),
            ("bistro", 0.9),
            ("eatery", 0.9),
            ("steakhouse", 0.95),
            ("burger", 0.85),
            ("sushi", 0.9),
            ("taco", 0.85),
            ("taqueria", 0.9),
            ("grill", 0.7),
            ("bbq", 0.8),
            ("barbecue", 0.8),
            ("catering", 0.8),
            ("caterer", 0.85),
            ("fast food", 0.9),
            ("food truck", 0.85),
            ("dining", 0.8),
            ("cuisine", 0.8),
            ("kitchen", 0.5),
            ("menu", 0.45),
            ("pasta", 0.7),
            ("noodle", 0.75),
            ("ramen", 0.85),
            ("brewpub", 0.7),
            ("food service", 0.85),
            ("takeout", 0.7),
        ],
        topics: &[
            ("restaurant", 0.95, 0.92),
            ("pizza", 0.9, 0.9),
            ("dining", 0.85, 0.85),
            ("menu", 0.7, 0.8),
            ("food", 0.7, 0.6),
            ("cuisine", 0.8, 0.85),
            ("kitchen", 0.6, 0.7),
            ("chef", 0.8, 0.85),
            ("burger", 0.85, 0.85),
            ("catering", 0.8, 0.8),
        ],
        patterns: &[
            ("pizza", "restaurant", 0.9),
            ("restaurant", "pizza", 0.9),
            ("food", "restaurant", 0.8),
            ("dining", "restaurant", 0.85),
            ("burger", "restaurant", 0.85),
            ("sushi", "restaurant", 0.85),
            ("catering", "dining", 0.7),
            ("restaurant", "food service", 0.8),
            ("menu", "restaurant", 0.75),
            ("grill", "restaurant", 0.75),
        ],
        codes: &[
            (Mcc, "5812", "Eating Places and Restaurants", 0.95),
            (Mcc, "5814", "Fast Food Restaurants", 0.7),
            (Mcc, "5811", "Caterers", 0.5),
            (Sic, "5812", "Eating Places", 0.95),
            (Naics, "722511", "Full-Service Restaurants", 0.95),
            (Naics, "722513", "Limited-Service Restaurants", 0.8),
            (Naics, "722320", "Caterers", 0.5),
        ],
    },
    IndustrySeed {
        name: "Coffee Shops",
        category: "Food Service",
        description: "Coffee houses, cafes and beverage bars",
        keywords: &[
            ("coffee", 0.9),
            ("cafe", 0.85),
            ("espresso", 0.9),
            ("latte", 0.8),
            ("coffee shop", 0.95),
            ("coffee house", 0.95),
            ("coffeehouse", 0.95),
            ("roastery", 0.85),
            ("roaster", 0.8),
            ("barista", 0.85),
            ("tea", 0.5),
            ("teahouse", 0.8),
            ("starbucks", 0.95),
            ("dunkin", 0.9),
        ],
        topics: &[
            ("coffee", 0.9, 0.9),
            ("espresso", 0.9, 0.9),
            ("cafe", 0.85, 0.85),
            ("latte", 0.8, 0.85),
            ("tea", 0.5, 0.6),
            ("pastry", 0.4, 0.5),
            ("bean", 0.5, 0.55),
        ],
        patterns: &[
            ("coffee", "cafe", 0.9),
            ("cafe", "coffee", 0.9),
            ("espresso", "coffee", 0.85),
            ("coffee", "starbucks", 0.95),
            ("starbucks", "coffee", 0.95),
            ("latte", "coffee", 0.85),
            ("tea", "cafe", 0.7),
            ("coffee", "coffee shop", 0.9),
        ],
        codes: &[
            (Mcc, "5814", "Fast Food Restaurants", 0.8),
            (Mcc, "5499", "Miscellaneous Food Stores", 0.4),
            (Sic, "5812", "Eating Places", 0.7),
            (Sic, "5499", "Miscellaneous Food Stores", 0.4),
            (Naics, "722515", "Snack and Nonalcoholic Beverage Bars", 0.95),
        ],
    },
    IndustrySeed {
        name: "Grocery & Food Retail",
        category: "Retail",
        description: "Grocery stores, bakeries and specialty food retailers",
        keywords: &[
            ("grocery", 0.95),
            ("grocer", 0.9),
            ("supermarket", 0.95),
            ("bakery", 0.95),
            ("baker", 0.8),
            ("butcher", 0.9),
            ("deli", 0.8),
            ("delicatessen", 0.85),
            ("farmers market", 0.85),
            ("organic", 0.5),
            ("produce", 0.6),
            ("kroger", 0.95),
            ("safeway", 0.95),
        ],
        topics: &[
            ("grocery", 0.95, 0.9),
            ("bread", 0.7, 0.75),
            ("produce", 0.7, 0.7),
            ("bakery", 0.9, 0.9),
            ("organic", 0.5, 0.55),
            ("food", 0.5, 0.5),
            ("meat", 0.6, 0.6),
        ],
        patterns: &[
            ("bakery", "bread", 0.9),
            ("bread", "bakery", 0.9),
            ("grocery", "produce", 0.85),
            ("produce", "grocery", 0.85),
            ("grocery", "supermarket", 0.9),
            ("supermarket", "grocery", 0.9),
        ],
        codes: &[
            (Mcc, "5411", "Grocery Stores, Supermarkets", 0.9),
            (Mcc, "5462", "Bakeries", 0.7),
            (Mcc, "5499", "Miscellaneous Food Stores", 0.5),
            (Sic, "5411", "Grocery Stores", 0.9),
            (Sic, "5461", "Retail Bakeries", 0.7),
            (Naics, "445110", "Supermarkets and Other Grocery Retailers", 0.9),
            (Naics, "311811", "Retail Bakeries", 0.7),
        ],
    },
    IndustrySeed {
        name: "Retail",
        category: "Retail",
        description: "General merchandise, apparel and specialty stores",
        keywords: &[
            ("retail", 0.9),
            ("retailer", 0.9),
            ("boutique", 0.85),
            ("store", 0.55),
            ("shop", 0.5),
            ("outlet", 0.6),
            ("clothing", 0.8),
            ("apparel", 0.85),
            ("fashion", 0.75),
            ("shoe", 0.75),
            ("footwear", 0.85),
            ("jewelry", 0.85),
            ("jeweler", 0.9),
            ("furniture", 0.75),
            ("gift shop", 0.85),
            ("department store", 0.9),
            ("walmart", 0.95),
            ("costco", 0.9),
        ],
        topics: &[
            ("clothing", 0.85, 0.8),
            ("fashion", 0.8, 0.75),
            ("apparel", 0.85, 0.8),
            ("jewelry", 0.85, 0.85),
            ("retail", 0.9, 0.8),
            ("shopping", 0.7, 0.65),
            ("furniture", 0.7, 0.7),
        ],
        patterns: &[
            ("boutique", "clothing", 0.9),
            ("clothing", "boutique", 0.9),
            ("fashion", "clothing", 0.8),
            ("jewelry", "boutique", 0.75),
            ("shoe", "retail", 0.7),
            ("store", "clothing", 0.75),
            ("retail", "clothing", 0.8),
        ],
        codes: &[
            (Mcc, "5651", "Family Clothing Stores", 0.8),
            (Mcc, "5311", "Department Stores", 0.5),
            (Mcc, "5944", "Jewelry Stores", 0.5),
            (Sic, "5651", "Family Clothing Stores", 0.8),
            (Sic, "5311", "Department Stores", 0.5),
            (Sic, "5944", "Jewelry Stores", 0.45),
            (Naics, "458110", "Clothing and Clothing Accessories Retailers", 0.8),
            (Naics, "455110", "Department Stores", 0.5),
            (Naics, "458310", "Jewelry Retailers", 0.45),
        ],
    },
    IndustrySeed {
        name: "Software & Technology",
        category: "Technology",
        description: "Software publishers, IT services and technology platforms",
        keywords: &[
            ("software", 0.95),
            ("saas", 0.9),
            ("technology", 0.7),
            ("tech", 0.6),
            ("cloud", 0.7),
            ("platform", 0.5),
            ("app", 0.55),
            ("mobile app", 0.85),
            ("developer", 0.7),
            ("development", 0.5),
            ("web development", 0.85),
            ("web design", 0.8),
            ("it service", 0.85),
            ("it consulting", 0.8),
            ("cybersecurity", 0.9),
            ("analytics", 0.7),
            ("data", 0.4),
            ("ai", 0.6),
            ("machine learning", 0.8),
            ("microsoft", 0.9),
            ("salesforce", 0.9),
            ("oracle", 0.8),
            ("digital", 0.4),
            ("startup", 0.4),
        ],
        topics: &[
            ("software", 0.95, 0.9),
            ("cloud", 0.8, 0.8),
            ("data", 0.6, 0.6),
            ("platform", 0.6, 0.6),
            ("technology", 0.8, 0.75),
            ("developer", 0.75, 0.8),
            ("security", 0.5, 0.5),
            ("api", 0.8, 0.8),
        ],
        patterns: &[
            ("software", "technology", 0.9),
            ("cloud", "software", 0.85),
            ("saas", "software", 0.9),
            ("software", "saas", 0.9),
            ("data", "analytics", 0.8),
            ("app", "mobile app", 0.85),
            ("technology", "software", 0.85),
            ("platform", "software", 0.8),
        ],
        codes: &[
            (
                Mcc,
                "7372",
                "Computer Programming, Data Processing, and Integrated Systems Design Services",
                0.95,
            ),
            (Mcc, "5734", "Computer Software Stores", 0.5),
            (Mcc, "7379", "Computer Maintenance and Repair Services", 0.4),
            (Sic, "7372", "Prepackaged Software", 0.9),
            (Sic, "7371", "Computer Programming Services", 0.8),
            (Sic, "7379", "Computer Related Services, NEC", 0.5),
            (Naics, "513210", "Software Publishers", 0.9),
            (Naics, "541511", "Custom Computer Programming Services", 0.85),
            (Naics, "541512", "Computer Systems Design Services", 0.6),
        ],
    },
    IndustrySeed {
        name: "Healthcare",
        category: "Healthcare",
        description: "Medical and dental practices, hospitals and pharmacies",
        keywords: &[
            ("clinic", 0.85),
            ("medical", 0.9),
            ("health", 0.55),
            ("healthcare", 0.9),
            ("doctor", 0.85),
            ("physician", 0.9),
            ("dental", 0.95),
            ("dentist", 0.95),
            ("orthodontist", 0.9),
            ("hospital", 0.95),
            ("pharmacy", 0.9),
            ("pharmacist", 0.9),
            ("therapy", 0.7),
            ("therapist", 0.7),
            ("chiropractic", 0.9),
            ("chiropractor", 0.9),
            ("pediatric", 0.85),
            ("urgent care", 0.9),
            ("nurse", 0.75),
            ("cvs", 0.85),
            ("walgreens", 0.9),
        ],
        topics: &[
            ("patient", 0.9, 0.9),
            ("medical", 0.9, 0.85),
            ("health", 0.6, 0.55),
            ("care", 0.4, 0.4),
            ("dental", 0.9, 0.9),
            ("treatment", 0.75, 0.75),
            ("clinic", 0.85, 0.85),
            ("prescription", 0.85, 0.8),
        ],
        patterns: &[
            ("dental", "teeth", 0.9),
            ("medical", "clinic", 0.9),
            ("clinic", "healthcare", 0.85),
            ("doctor", "clinic", 0.85),
            ("pharmacy", "prescription", 0.9),
            ("health", "clinic", 0.8),
            ("patient", "healthcare", 0.85),
            ("dentist", "teeth", 0.9),
        ],
        codes: &[
            (Mcc, "8011", "Doctors and Physicians", 0.9),
            (Mcc, "8021", "Dentists and Orthodontists", 0.7),
            (Mcc, "8062", "Hospitals", 0.5),
            (Mcc, "5912", "Drug Stores and Pharmacies", 0.45),
            (Sic, "8011", "Offices and Clinics of Doctors of Medicine", 0.9),
            (Sic, "8021", "Offices and Clinics of Dentists", 0.7),
            (Sic, "8062", "General Medical and Surgical Hospitals", 0.5),
            (
                Naics,
                "621111",
                "Offices of Physicians (except Mental Health Specialists)",
                0.9,
            ),
            (Naics, "621210", "Offices of Dentists", 0.7),
            (Naics, "622110", "General Medical and Surgical Hospitals", 0.5),
        ],
    },
    IndustrySeed {
        name: "Legal Services",
        category: "Professional Services",
        description: "Law firms, attorneys and legal support",
        keywords: &[
            ("law", 0.75),
            ("lawyer", 0.95),
            ("attorney", 0.95),
            ("legal", 0.85),
            ("law firm", 0.95),
            ("law office", 0.9),
            ("litigation", 0.9),
            ("paralegal", 0.8),
            ("counsel", 0.7),
            ("estate planning", 0.8),
            ("notary", 0.6),
            ("injury", 0.5),
        ],
        topics: &[
            ("legal", 0.9, 0.85),
            ("law", 0.85, 0.8),
            ("attorney", 0.95, 0.9),
            ("court", 0.8, 0.8),
            ("litigation", 0.9, 0.85),
            ("client", 0.3, 0.3),
        ],
        patterns: &[
            ("law", "law firm", 0.9),
            ("attorney", "legal", 0.9),
            ("legal", "attorney", 0.9),
            ("lawyer", "law firm", 0.9),
            ("litigation", "attorney", 0.85),
            ("law", "attorney", 0.9),
        ],
        codes: &[
            (Mcc, "8111", "Legal Services and Attorneys", 0.95),
            (Sic, "8111", "Legal Services", 0.95),
            (Naics, "541110", "Offices of Lawyers", 0.95),
            (Naics, "541120", "Offices of Notaries", 0.3),
        ],
    },
    IndustrySeed {
        name: "Construction",
        category: "Construction",
        description: "General contractors and specialty trades",
        keywords: &[
            ("construction", 0.95),
            ("contractor", 0.85),
            ("general contractor", 0.95),
            ("builder", 0.8),
            ("roofing", 0.9),
            ("roofer", 0.9),
            ("plumbing", 0.9),
            ("plumber", 0.9),
            ("electrician", 0.85),
            ("electrical", 0.6),
            ("remodeling", 0.85),
            ("remodel", 0.8),
            ("renovation", 0.8),
            ("hvac", 0.85),
            ("concrete", 0.8),
            ("carpentry", 0.85),
            ("excavation", 0.85),
            ("drywall", 0.85),
        ],
        topics: &[
            ("construction", 0.95, 0.9),
            ("building", 0.6, 0.6),
            ("renovation", 0.8, 0.8),
            ("roof", 0.85, 0.85),
            ("plumbing", 0.85, 0.85),
            ("home", 0.3, 0.3),
            ("contractor", 0.85, 0.85),
        ],
        patterns: &[
            ("construction", "contractor", 0.9),
            ("contractor", "construction", 0.9),
            ("remodeling", "contractor", 0.85),
            ("plumbing", "hvac", 0.8),
            ("roofing", "contractor", 0.85),
            ("home", "renovation", 0.75),
            ("building", "construction", 0.8),
        ],
        codes: &[
            (Mcc, "1520", "General Contractors - Residential and Commercial", 0.9),
            (Mcc, "1711", "Heating, Plumbing, and Air-Conditioning Contractors", 0.7),
            (Mcc, "1731", "Electrical Contractors", 0.55),
            (Sic, "1521", "General Contractors - Single-Family Houses", 0.85),
            (Sic, "1711", "Plumbing, Heating and Air-Conditioning", 0.7),
            (Sic, "1731", "Electrical Work", 0.55),
            (Naics, "236118", "Residential Remodelers", 0.8),
            (
                Naics,
                "238220",
                "Plumbing, Heating, and Air-Conditioning Contractors",
                0.7,
            ),
            (
                Naics,
                "236220",
                "Commercial and Institutional Building Construction",
                0.6,
            ),
        ],
    },
    IndustrySeed {
        name: "Automotive",
        category: "Automotive",
        description: "Vehicle repair, dealers and related services",
        keywords: &[
            ("auto", 0.8),
            ("automotive", 0.95),
            ("car", 0.6),
            ("mechanic", 0.9),
            ("auto repair", 0.95),
            ("auto body", 0.9),
            ("body shop", 0.85),
            ("tire", 0.85),
            ("dealership", 0.9),
            ("car dealer", 0.9),
            ("oil change", 0.9),
            ("collision", 0.8),
            ("vehicle", 0.6),
            ("transmission", 0.7),
            ("brake", 0.75),
            ("car wash", 0.85),
            ("jiffy lube", 0.95),
        ],
        topics: &[
            ("car", 0.75, 0.7),
            ("vehicle", 0.8, 0.75),
            ("repair", 0.5, 0.5),
            ("engine", 0.8, 0.8),
            ("tire", 0.85, 0.85),
            ("automotive", 0.9, 0.9),
            ("brake", 0.8, 0.8),
        ],
        patterns: &[
            ("auto", "auto repair", 0.9),
            ("car", "mechanic", 0.85),
            ("tire", "auto repair", 0.85),
            ("brake", "auto repair", 0.85),
            ("car", "dealership", 0.85),
            ("vehicle", "automotive", 0.85),
            ("repair", "mechanic", 0.8),
        ],
        codes: &[
            (Mcc, "7538", "Automotive Service Shops (Non-Dealer)", 0.9),
            (Mcc, "5511", "Car and Truck Dealers (New and Used)", 0.6),
            (Mcc, "5532", "Automotive Tire Stores", 0.5),
            (Sic, "7538", "General Automotive Repair Shops", 0.9),
            (Sic, "5511", "Motor Vehicle Dealers (New and Used)", 0.6),
            (
                Sic,
                "7532",
                "Top, Body, and Upholstery Repair Shops and Paint Shops",
                0.5,
            ),
            (Naics, "811111", "General Automotive Repair", 0.9),
            (Naics, "441110", "New Car Dealers", 0.6),
            (
                Naics,
                "811121",
                "Automotive Body, Paint, and Interior Repair and Maintenance",
                0.5,
            ),
        ],
    },
    IndustrySeed {
        name: "Financial Services",
        category: "Finance",
        description: "Banking, lending, insurance and accounting",
        keywords: &[
            ("bank", 0.9),
            ("banking", 0.9),
            ("finance", 0.8),
            ("financial", 0.8),
            ("insurance", 0.85),
            ("investment", 0.85),
            ("accounting", 0.85),
            ("accountant", 0.9),
            ("cpa", 0.9),
            ("tax", 0.7),
            ("lending", 0.85),
            ("loan", 0.75),
            ("mortgage", 0.85),
            ("credit", 0.6),
            ("credit union", 0.95),
            ("bookkeeping", 0.85),
            ("wealth", 0.75),
            ("advisor", 0.5),
        ],
        topics: &[
            ("financial", 0.85, 0.8),
            ("investment", 0.85, 0.85),
            ("tax", 0.75, 0.75),
            ("loan", 0.8, 0.8),
            ("insurance", 0.85, 0.8),
            ("money", 0.6, 0.55),
            ("account", 0.5, 0.5),
        ],
        patterns: &[
            ("tax", "accounting", 0.9),
            ("accounting", "tax", 0.9),
            ("bank", "loan", 0.85),
            ("loan", "bank", 0.85),
            ("insurance", "finance", 0.75),
            ("mortgage", "loan", 0.85),
            ("investment", "finance", 0.85),
            ("financial", "bank", 0.8),
        ],
        codes: &[
            (Mcc, "6012", "Financial Institutions - Merchandise and Services", 0.75),
            (Mcc, "8931", "Accounting, Auditing, and Bookkeeping Services", 0.7),
            (Mcc, "6300", "Insurance Sales, Underwriting, and Premiums", 0.55),
            (Sic, "6021", "National Commercial Banks", 0.7),
            (Sic, "8721", "Accounting, Auditing, and Bookkeeping Services", 0.7),
            (Sic, "6411", "Insurance Agents, Brokers, and Service", 0.55),
            (Naics, "522110", "Commercial Banking", 0.7),
            (Naics, "541211", "Offices of Certified Public Accountants", 0.7),
            (Naics, "524210", "Insurance Agencies and Brokerages", 0.55),
        ],
    },
    IndustrySeed {
        name: "Real Estate",
        category: "Real Estate",
        description: "Brokerage, leasing and property management",
        keywords: &[
            ("real estate", 0.95),
            ("realty", 0.95),
            ("realtor", 0.95),
            ("property", 0.7),
            ("apartment", 0.7),
            ("leasing", 0.7),
            ("broker", 0.55),
            ("housing", 0.6),
            ("home", 0.45),
            ("condo", 0.75),
            ("property management", 0.9),
            ("rental", 0.6),
            ("landlord", 0.75),
        ],
        topics: &[
            ("property", 0.85, 0.8),
            ("home", 0.5, 0.5),
            ("estate", 0.6, 0.6),
            ("rental", 0.7, 0.7),
            ("listing", 0.8, 0.8),
            ("apartment", 0.75, 0.75),
            ("housing", 0.7, 0.7),
        ],
        patterns: &[
            ("realty", "real estate", 0.95),
            ("property", "real estate", 0.85),
            ("home", "realty", 0.8),
            ("apartment", "property management", 0.85),
            ("rental", "apartment", 0.8),
            ("real estate", "realty", 0.9),
        ],
        codes: &[
            (Mcc, "6513", "Real Estate Agents and Managers - Rentals", 0.9),
            (Sic, "6531", "Real Estate Agents and Managers", 0.9),
            (Sic, "6513", "Operators of Apartment Buildings", 0.55),
            (Naics, "531210", "Offices of Real Estate Agents and Brokers", 0.9),
            (Naics, "531110", "Lessors of Residential Buildings and Dwellings", 0.55),
            (Naics, "531311", "Residential Property Managers", 0.6),
        ],
    },
    IndustrySeed {
        name: "Hotels & Lodging",
        category: "Hospitality",
        description: "Hotels, motels, inns and short-term lodging",
        keywords: &[
            ("hotel", 0.95),
            ("motel", 0.95),
            ("inn", 0.8),
            ("lodging", 0.9),
            ("resort", 0.9),
            ("hostel", 0.9),
            ("bed and breakfast", 0.95),
            ("suite", 0.5),
            ("accommodation", 0.8),
            ("hospitality", 0.75),
            ("marriott", 0.95),
            ("hilton", 0.95),
            ("hyatt", 0.95),
        ],
        topics: &[
            ("hotel", 0.95, 0.9),
            ("room", 0.6, 0.6),
            ("stay", 0.7, 0.7),
            ("guest", 0.7, 0.7),
            ("resort", 0.85, 0.85),
            ("booking", 0.6, 0.55),
            ("travel", 0.6, 0.55),
        ],
        patterns: &[
            ("hotel", "hospitality", 0.9),
            ("resort", "hotel", 0.85),
            ("room", "hotel", 0.85),
            ("guest", "hotel", 0.8),
            ("inn", "lodging", 0.85),
            ("motel", "lodging", 0.85),
            ("hotel", "guest room", 0.85),
        ],
        codes: &[
            (Mcc, "7011", "Hotels, Motels, and Resorts", 0.95),
            (Sic, "7011", "Hotels and Motels", 0.95),
            (Sic, "7021", "Rooming and Boarding Houses", 0.3),
            (Naics, "721110", "Hotels (except Casino Hotels) and Motels", 0.95),
            (Naics, "721191", "Bed-and-Breakfast Inns", 0.5),
        ],
    },
    IndustrySeed {
        name: "Fitness & Recreation",
        category: "Health & Wellness",
        description: "Gyms, studios and sports instruction",
        keywords: &[
            ("gym", 0.95),
            ("fitness", 0.95),
            ("yoga", 0.9),
            ("pilates", 0.9),
            ("crossfit", 0.95),
            ("personal training", 0.9),
            ("personal trainer", 0.9),
            ("workout", 0.8),
            ("martial art", 0.85),
            ("karate", 0.85),
            ("studio", 0.4),
            ("athletic", 0.6),
            ("planet fitness", 0.95),
        ],
        topics: &[
            ("fitness", 0.95, 0.9),
            ("workout", 0.85, 0.85),
            ("training", 0.6, 0.6),
            ("class", 0.35, 0.35),
            ("yoga", 0.9, 0.9),
            ("exercise", 0.85, 0.85),
            ("strength", 0.6, 0.6),
        ],
        patterns: &[
            ("gym", "fitness", 0.9),
            ("fitness", "gym", 0.9),
            ("yoga", "wellness", 0.85),
            ("training", "gym", 0.8),
            ("workout", "fitness", 0.85),
            ("pilates", "fitness", 0.85),
        ],
        codes: &[
            (
                Mcc,
                "7997",
                "Membership Clubs (Sports, Recreation, Athletic), Country Clubs",
                0.85,
            ),
            (Mcc, "7941", "Commercial Sports, Professional Sports Clubs", 0.3),
            (Sic, "7991", "Physical Fitness Facilities", 0.95),
            (Naics, "713940", "Fitness and Recreational Sports Centers", 0.95),
            (Naics, "611620", "Sports and Recreation Instruction", 0.5),
        ],
    },
    IndustrySeed {
        name: "Beauty & Personal Care",
        category: "Personal Services",
        description: "Salons, barbers, spas and cosmetic services",
        keywords: &[
            ("salon", 0.95),
            ("spa", 0.85),
            ("barber", 0.95),
            ("barbershop", 0.95),
            ("beauty", 0.85),
            ("nail", 0.85),
            ("hair", 0.7),
            ("haircut", 0.85),
            ("cosmetic", 0.8),
            ("massage", 0.8),
            ("skincare", 0.8),
            ("esthetician", 0.9),
            ("manicure", 0.85),
            ("pedicure", 0.85),
            ("lash", 0.8),
            ("wax", 0.6),
        ],
        topics: &[
            ("hair", 0.85, 0.85),
            ("beauty", 0.9, 0.85),
            ("nail", 0.85, 0.85),
            ("skin", 0.7, 0.7),
            ("massage", 0.8, 0.8),
            ("style", 0.4, 0.4),
            ("relax", 0.5, 0.5),
        ],
        patterns: &[
            ("hair", "salon", 0.9),
            ("salon", "haircut", 0.9),
            ("nail", "salon", 0.9),
            ("beauty", "salon", 0.85),
            ("massage", "spa", 0.85),
            ("spa", "massage", 0.85),
            ("barber", "haircut", 0.9),
            ("beauty", "spa", 0.8),
        ],
        codes: &[
            (Mcc, "7230", "Beauty and Barber Shops", 0.95),
            (Mcc, "7298", "Health and Beauty Spas", 0.7),
            (Sic, "7231", "Beauty Shops", 0.9),
            (Sic, "7241", "Barber Shops", 0.7),
            (Naics, "812112", "Beauty Salons", 0.9),
            (Naics, "812111", "Barber Shops", 0.7),
            (Naics, "812199", "Other Personal Care Services", 0.45),
        ],
    },
    IndustrySeed {
        name: "Education",
        category: "Education",
        description: "Schools, tutoring and educational services",
        keywords: &[
            ("school", 0.85),
            ("academy", 0.8),
            ("tutoring", 0.9),
            ("tutor", 0.9),
            ("education", 0.9),
            ("learning", 0.6),
            ("training", 0.5),
            ("university", 0.95),
            ("college", 0.9),
            ("preschool", 0.95),
            ("daycare", 0.85),
            ("driving school", 0.95),
            ("montessori", 0.95),
            ("course", 0.5),
        ],
        topics: &[
            ("student", 0.9, 0.9),
            ("education", 0.9, 0.85),
            ("learning", 0.7, 0.7),
            ("class", 0.6, 0.55),
            ("teacher", 0.85, 0.85),
            ("course", 0.7, 0.7),
            ("curriculum", 0.85, 0.85),
        ],
        patterns: &[
            ("school", "education", 0.9),
            ("tutoring", "education", 0.85),
            ("student", "school", 0.85),
            ("learning", "academy", 0.8),
            ("class", "school", 0.75),
        ],
        codes: &[
            (Mcc, "8299", "Schools and Educational Services", 0.85),
            (Mcc, "8211", "Elementary and Secondary Schools", 0.55),
            (Mcc, "8220", "Colleges, Universities", 0.45),
            (Sic, "8299", "Schools and Educational Services, NEC", 0.85),
            (Sic, "8211", "Elementary and Secondary Schools", 0.55),
            (Naics, "611691", "Exam Preparation and Tutoring", 0.8),
            (Naics, "611110", "Elementary and Secondary Schools", 0.55),
            (Naics, "611310", "Colleges, Universities, and Professional Schools", 0.45),
        ],
    },
];

/// Codes reachable only through keyword lookup or crosswalks
const EXTRA_CODES: &[(CodeType, &str, &str)] = &[
    (Mcc, "7542", "Car Washes"),
    (Sic, "7542", "Carwashes"),
    (Naics, "811192", "Car Washes"),
    (Naics, "456110", "Pharmacies and Drug Retailers"),
    (
        Naics,
        "238210",
        "Electrical Contractors and Other Wiring Installation Contractors",
    ),
];

/// (type, code, keyword, weight)
const CODE_KEYWORDS: &[(CodeType, &str, &str, f64)] = &[
    (Mcc, "5814", "fast food", 0.9),
    (Mcc, "5814", "burger", 0.75),
    (Mcc, "5814", "coffee", 0.6),
    (Mcc, "5814", "takeout", 0.6),
    (Mcc, "5812", "restaurant", 0.9),
    (Mcc, "5812", "dining", 0.8),
    (Mcc, "5812", "pizza", 0.7),
    (Mcc, "5811", "catering", 0.9),
    (Mcc, "5811", "caterer", 0.9),
    (Mcc, "5462", "bakery", 0.9),
    (Mcc, "5411", "grocery", 0.9),
    (Mcc, "5411", "supermarket", 0.9),
    (Mcc, "5499", "deli", 0.6),
    (Mcc, "5499", "coffee", 0.4),
    (Mcc, "7372", "software", 0.9),
    (Mcc, "7372", "saas", 0.85),
    (Mcc, "5734", "software", 0.4),
    (Mcc, "8021", "dental", 0.95),
    (Mcc, "8021", "dentist", 0.95),
    (Mcc, "8011", "doctor", 0.9),
    (Mcc, "8011", "physician", 0.9),
    (Mcc, "8011", "clinic", 0.7),
    (Mcc, "5912", "pharmacy", 0.95),
    (Mcc, "8111", "lawyer", 0.95),
    (Mcc, "8111", "attorney", 0.95),
    (Mcc, "1711", "plumbing", 0.9),
    (Mcc, "1711", "hvac", 0.9),
    (Mcc, "1731", "electrician", 0.9),
    (Mcc, "1520", "construction", 0.85),
    (Mcc, "1520", "contractor", 0.8),
    (Mcc, "1520", "roofing", 0.7),
    (Mcc, "5532", "tire", 0.9),
    (Mcc, "7538", "mechanic", 0.9),
    (Mcc, "7538", "auto repair", 0.9),
    (Mcc, "7542", "car wash", 0.95),
    (Mcc, "8931", "accounting", 0.9),
    (Mcc, "8931", "bookkeeping", 0.9),
    (Mcc, "8931", "tax", 0.6),
    (Mcc, "6300", "insurance", 0.9),
    (Mcc, "6513", "realty", 0.85),
    (Mcc, "6513", "rental", 0.7),
    (Mcc, "7011", "hotel", 0.95),
    (Mcc, "7011", "motel", 0.95),
    (Mcc, "7011", "resort", 0.8),
    (Mcc, "7997", "gym", 0.85),
    (Mcc, "7997", "fitness", 0.85),
    (Mcc, "7230", "salon", 0.9),
    (Mcc, "7230", "barber", 0.9),
    (Mcc, "7230", "haircut", 0.85),
    (Mcc, "7298", "spa", 0.9),
    (Mcc, "7298", "massage", 0.85),
    (Mcc, "8299", "tutoring", 0.85),
    (Mcc, "8299", "school", 0.7),
    (Sic, "5812", "restaurant", 0.9),
    (Sic, "5812", "pizza", 0.7),
    (Sic, "5812", "coffee", 0.5),
    (Sic, "5461", "bakery", 0.9),
    (Sic, "7372", "software", 0.9),
    (Sic, "8021", "dental", 0.9),
    (Sic, "8111", "lawyer", 0.9),
    (Sic, "8111", "attorney", 0.9),
    (Sic, "1711", "plumbing", 0.9),
    (Sic, "1711", "hvac", 0.9),
    (Sic, "7538", "mechanic", 0.9),
    (Sic, "7542", "car wash", 0.95),
    (Sic, "8721", "accounting", 0.9),
    (Sic, "7011", "hotel", 0.9),
    (Sic, "7991", "gym", 0.9),
    (Sic, "7991", "yoga", 0.8),
    (Sic, "7231", "salon", 0.9),
    (Sic, "7241", "barber", 0.9),
    (Naics, "722513", "fast food", 0.9),
    (Naics, "722513", "pizza", 0.6),
    (Naics, "722513", "burger", 0.8),
    (Naics, "722513", "takeout", 0.6),
    (Naics, "722511", "restaurant", 0.9),
    (Naics, "722511", "dining", 0.8),
    (Naics, "722320", "catering", 0.9),
    (Naics, "722515", "coffee", 0.9),
    (Naics, "722515", "cafe", 0.85),
    (Naics, "311811", "bakery", 0.9),
    (Naics, "513210", "software", 0.9),
    (Naics, "513210", "saas", 0.9),
    (Naics, "541511", "developer", 0.8),
    (Naics, "541511", "web development", 0.85),
    (Naics, "621210", "dental", 0.9),
    (Naics, "621210", "dentist", 0.9),
    (Naics, "456110", "pharmacy", 0.95),
    (Naics, "541110", "lawyer", 0.9),
    (Naics, "541110", "attorney", 0.9),
    (Naics, "238220", "plumbing", 0.9),
    (Naics, "238220", "hvac", 0.9),
    (Naics, "238210", "electrician", 0.9),
    (Naics, "811111", "mechanic", 0.9),
    (Naics, "811111", "auto repair", 0.9),
    (Naics, "811192", "car wash", 0.95),
    (Naics, "541211", "accounting", 0.9),
    (Naics, "531210", "realty", 0.9),
    (Naics, "531210", "realtor", 0.9),
    (Naics, "721110", "hotel", 0.9),
    (Naics, "721110", "motel", 0.9),
    (Naics, "721191", "bed and breakfast", 0.95),
    (Naics, "713940", "gym", 0.9),
    (Naics, "713940", "fitness", 0.9),
    (Naics, "812112", "salon", 0.9),
    (Naics, "812111", "barber", 0.9),
    (Naics, "611691", "tutoring", 0.9),
];

/// Equivalences between schemes; inserted in both directions
const CROSSWALKS: &[(CodeType, &str, CodeType, &str, f64)] = &[
    (Mcc, "5812", Sic, "5812", 0.95),
    (Mcc, "5812", Naics, "722511", 0.9),
    (Sic, "5812", Naics, "722511", 0.85),
    (Sic, "5812", Naics, "722513", 0.8),
    (Mcc, "5814", Naics, "722513", 0.9),
    (Mcc, "5814", Sic, "5812", 0.8),
    (Mcc, "5814", Naics, "722515", 0.6),
    (Mcc, "5811", Naics, "722320", 0.9),
    (Mcc, "5811", Sic, "5812", 0.6),
    (Mcc, "5411", Sic, "5411", 0.95),
    (Sic, "5411", Naics, "445110", 0.9),
    (Mcc, "5462", Sic, "5461", 0.9),
    (Sic, "5461", Naics, "311811", 0.9),
    (Mcc, "5499", Sic, "5499", 0.9),
    (Mcc, "5651", Sic, "5651", 0.95),
    (Sic, "5651", Naics, "458110", 0.85),
    (Mcc, "5311", Sic, "5311", 0.95),
    (Sic, "5311", Naics, "455110", 0.9),
    (Mcc, "5944", Sic, "5944", 0.95),
    (Sic, "5944", Naics, "458310", 0.9),
    (Mcc, "7372", Sic, "7372", 0.9),
    (Mcc, "7372", Sic, "7371", 0.8),
    (Sic, "7372", Naics, "513210", 0.9),
    (Sic, "7371", Naics, "541511", 0.9),
    (Sic, "7379", Naics, "541512", 0.7),
    (Mcc, "8011", Sic, "8011", 0.95),
    (Sic, "8011", Naics, "621111", 0.9),
    (Mcc, "8021", Sic, "8021", 0.95),
    (Sic, "8021", Naics, "621210", 0.95),
    (Mcc, "8062", Sic, "8062", 0.95),
    (Sic, "8062", Naics, "622110", 0.95),
    (Mcc, "5912", Naics, "456110", 0.9),
    (Mcc, "8111", Sic, "8111", 0.95),
    (Sic, "8111", Naics, "541110", 0.95),
    (Mcc, "1520", Sic, "1521", 0.9),
    (Sic, "1521", Naics, "236118", 0.8),
    (Mcc, "1711", Sic, "1711", 0.95),
    (Sic, "1711", Naics, "238220", 0.95),
    (Mcc, "1731", Sic, "1731", 0.95),
    (Sic, "1731", Naics, "238210", 0.95),
    (Mcc, "7538", Sic, "7538", 0.95),
    (Sic, "7538", Naics, "811111", 0.95),
    (Mcc, "5511", Sic, "5511", 0.95),
    (Sic, "5511", Naics, "441110", 0.9),
    (Mcc, "7542", Sic, "7542", 0.95),
    (Sic, "7542", Naics, "811192", 0.95),
    (Mcc, "6012", Sic, "6021", 0.8),
    (Sic, "6021", Naics, "522110", 0.9),
    (Mcc, "8931", Sic, "8721", 0.95),
    (Sic, "8721", Naics, "541211", 0.85),
    (Mcc, "6300", Sic, "6411", 0.8),
    (Sic, "6411", Naics, "524210", 0.9),
    (Mcc, "6513", Sic, "6531", 0.9),
    (Sic, "6531", Naics, "531210", 0.9),
    (Sic, "6513", Naics, "531110", 0.9),
    (Mcc, "7011", Sic, "7011", 0.95),
    (Sic, "7011", Naics, "721110", 0.95),
    (Mcc, "7997", Sic, "7991", 0.8),
    (Sic, "7991", Naics, "713940", 0.95),
    (Mcc, "7230", Sic, "7231", 0.9),
    (Mcc, "7230", Sic, "7241", 0.8),
    (Sic, "7231", Naics, "812112", 0.95),
    (Sic, "7241", Naics, "812111", 0.95),
    (Mcc, "7298", Naics, "812199", 0.7),
    (Mcc, "8299", Sic, "8299", 0.95),
    (Sic, "8299", Naics, "611691", 0.7),
    (Mcc, "8211", Sic, "8211", 0.95),
    (Sic, "8211", Naics, "611110", 0.95),
    (Mcc, "8220", Naics, "611310", 0.9),
];

/// Row counts after seeding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub industries: usize,
    pub keywords: usize,
    pub topics: usize,
    pub patterns: usize,
    pub codes: usize,
    pub crosswalks: usize,
}

/// Whether the taxonomy tables already hold data
pub fn is_seeded(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM industries", [], |row| row.get(0))?;
    Ok(count > 0)
}

/// Insert the built-in taxonomy. Idempotent: existing rows are left alone.
pub fn seed_default_taxonomy(conn: &Connection) -> Result<SeedStats> {
    let tx = conn.unchecked_transaction()?;

    for industry in INDUSTRIES {
        tx.execute(
            "INSERT OR IGNORE INTO industries (name, category, description) VALUES (?1, ?2, ?3)",
            params![industry.name, industry.category, industry.description],
        )?;
        let id: i64 = tx.query_row(
            "SELECT id FROM industries WHERE name = ?1",
            [industry.name],
            |row| row.get(0),
        )?;

        for (keyword, weight) in industry.keywords {
            tx.execute(
                "INSERT OR IGNORE INTO industry_keywords (industry_id, keyword, weight) VALUES (?1, ?2, ?3)",
                params![id, keyword, weight],
            )?;
        }
        for (topic, relevance, accuracy) in industry.topics {
            tx.execute(
                "INSERT OR IGNORE INTO industry_topics (topic, industry_id, relevance, accuracy) VALUES (?1, ?2, ?3, ?4)",
                params![topic, id, relevance, accuracy],
            )?;
        }
        for (keyword, entity, strength) in industry.patterns {
            tx.execute(
                "INSERT OR IGNORE INTO keyword_patterns (keyword, entity, industry_id, strength) VALUES (?1, ?2, ?3, ?4)",
                params![keyword, entity, id, strength],
            )?;
        }
        for (code_type, code, description, relevance) in industry.codes {
            insert_code(&tx, *code_type, code, description)?;
            tx.execute(
                "INSERT OR IGNORE INTO industry_codes (industry_id, code_type, code, relevance) VALUES (?1, ?2, ?3, ?4)",
                params![id, code_type.as_str(), code, relevance],
            )?;
        }
    }

    for (code_type, code, description) in EXTRA_CODES {
        insert_code(&tx, *code_type, code, description)?;
    }

    for (code_type, code, keyword, weight) in CODE_KEYWORDS {
        tx.execute(
            "INSERT OR IGNORE INTO code_keywords (code_type, code, keyword, weight) VALUES (?1, ?2, ?3, ?4)",
            params![code_type.as_str(), code, keyword, weight],
        )?;
    }

    for (from_type, from_code, to_type, to_code, confidence) in CROSSWALKS {
        for (a_type, a_code, b_type, b_code) in [
            (from_type, from_code, to_type, to_code),
            (to_type, to_code, from_type, from_code),
        ] {
            tx.execute(
                "INSERT OR IGNORE INTO code_crosswalks (from_type, from_code, to_type, to_code, confidence) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![a_type.as_str(), a_code, b_type.as_str(), b_code, confidence],
            )?;
        }
    }

    tx.commit()?;

    let stats = SeedStats {
        industries: count(conn, "industries")?,
        keywords: count(conn, "industry_keywords")?,
        topics: count(conn, "industry_topics")?,
        patterns: count(conn, "keyword_patterns")?,
        codes: count(conn, "classification_codes")?,
        crosswalks: count(conn, "code_crosswalks")?,
    };
    info!(
        industries = stats.industries,
        keywords = stats.keywords,
        codes = stats.codes,
        "Taxonomy seeded"
    );
    Ok(stats)
}

fn insert_code(
    conn: &Connection,
    code_type: CodeType,
    code: &str,
    description: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR IGNORE INTO classification_codes (code_type, code, description) VALUES (?1, ?2, ?3)",
        params![code_type.as_str(), code, description],
    )
}

fn count(conn: &Connection, table: &str) -> rusqlite::Result<usize> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
}
