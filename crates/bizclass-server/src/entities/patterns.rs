// crates/bizclass-server/src/entities/patterns.rs
// Entity pattern library
//
// Each row: (type, regex over lowercased text, canonical value, industry).
// A `None` value means the matched text itself is the value.

use super::EntityType::{self, Brand, BusinessType, IndustryIndicator, Location, Product, Service};

pub(super) type PatternSpec = (
    EntityType,
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
);

const RESTAURANTS: Option<&str> = Some("Restaurants");
const COFFEE: Option<&str> = Some("Coffee Shops");
const GROCERY: Option<&str> = Some("Grocery & Food Retail");
const RETAIL: Option<&str> = Some("Retail");
const TECH: Option<&str> = Some("Software & Technology");
const HEALTH: Option<&str> = Some("Healthcare");
const LEGAL: Option<&str> = Some("Legal Services");
const CONSTRUCTION: Option<&str> = Some("Construction");
const AUTO: Option<&str> = Some("Automotive");
const FINANCE: Option<&str> = Some("Financial Services");
const REAL_ESTATE: Option<&str> = Some("Real Estate");
const LODGING: Option<&str> = Some("Hotels & Lodging");
const FITNESS: Option<&str> = Some("Fitness & Recreation");
const BEAUTY: Option<&str> = Some("Beauty & Personal Care");
const EDUCATION: Option<&str> = Some("Education");

pub(super) const PATTERNS: &[PatternSpec] = &[
    // Business types
    (BusinessType, r"\brestaurants?\b", Some("restaurant"), RESTAURANTS),
    (BusinessType, r"\bpizzerias?\b", Some("pizzeria"), RESTAURANTS),
    (BusinessType, r"\bdiners?\b", Some("diner"), RESTAURANTS),
    (BusinessType, r"\bbistros?\b", Some("bistro"), RESTAURANTS),
    (BusinessType, r"\bsteak\s*houses?\b", Some("steakhouse"), RESTAURANTS),
    (BusinessType, r"\beater(?:y|ies)\b", Some("eatery"), RESTAURANTS),
    (BusinessType, r"\bfood\s+trucks?\b", Some("food truck"), RESTAURANTS),
    (BusinessType, r"\bcaf(?:e|é)s?\b", Some("cafe"), COFFEE),
    (BusinessType, r"\bcoffee\s*(?:shop|house)s?\b", Some("coffee shop"), COFFEE),
    (BusinessType, r"\broaster(?:y|ies|s)?\b", Some("roastery"), COFFEE),
    (BusinessType, r"\bbaker(?:y|ies)\b", Some("bakery"), GROCERY),
    (BusinessType, r"\bgrocer(?:y|ies|s)?\b", Some("grocery"), GROCERY),
    (BusinessType, r"\bsupermarkets?\b", Some("supermarket"), GROCERY),
    (BusinessType, r"\bbutchers?\b", Some("butcher"), GROCERY),
    (BusinessType, r"\b(?:delis?|delicatessens?)\b", Some("deli"), GROCERY),
    (BusinessType, r"\bboutiques?\b", Some("boutique"), RETAIL),
    (BusinessType, r"\bdepartment\s+stores?\b", Some("department store"), RETAIL),
    (BusinessType, r"\bgift\s+shops?\b", Some("gift shop"), RETAIL),
    (BusinessType, r"\bjewel(?:l)?ers?\b", Some("jeweler"), RETAIL),
    (BusinessType, r"\bclinics?\b", Some("clinic"), HEALTH),
    (BusinessType, r"\bhospitals?\b", Some("hospital"), HEALTH),
    (BusinessType, r"\bpharmac(?:y|ies)\b", Some("pharmacy"), HEALTH),
    (BusinessType, r"\bdentists?\b", Some("dentist"), HEALTH),
    (BusinessType, r"\b(?:physicians?|doctors?)\b", Some("physician"), HEALTH),
    (BusinessType, r"\bchiropract(?:or|ors|ic)\b", Some("chiropractic"), HEALTH),
    (BusinessType, r"\burgent\s+care\b", Some("urgent care"), HEALTH),
    (BusinessType, r"\blaw\s+(?:firm|office|group)s?\b", Some("law firm"), LEGAL),
    (BusinessType, r"\battorneys?\b", Some("attorney"), LEGAL),
    (BusinessType, r"\blawyers?\b", Some("lawyer"), LEGAL),
    (BusinessType, r"\b(?:general\s+)?contractors?\b", Some("contractor"), CONSTRUCTION),
    (BusinessType, r"\bbuilders?\b", Some("builder"), CONSTRUCTION),
    (BusinessType, r"\broof(?:ing|ers?)\b", Some("roofing"), CONSTRUCTION),
    (BusinessType, r"\bplumb(?:ing|ers?)\b", Some("plumbing"), CONSTRUCTION),
    (BusinessType, r"\bhvac\b", Some("hvac"), CONSTRUCTION),
    (BusinessType, r"\belectricians?\b", Some("electrician"), CONSTRUCTION),
    (BusinessType, r"\bauto\s+(?:repair|body|shop)s?\b", Some("auto repair"), AUTO),
    (BusinessType, r"\bmechanics?\b", Some("mechanic"), AUTO),
    (BusinessType, r"\b(?:dealerships?|car\s+dealers?)\b", Some("dealership"), AUTO),
    (BusinessType, r"\bcar\s*wash(?:es)?\b", Some("car wash"), AUTO),
    (BusinessType, r"\bbank(?:s|ing)?\b", Some("bank"), FINANCE),
    (BusinessType, r"\bcredit\s+unions?\b", Some("credit union"), FINANCE),
    (BusinessType, r"\b(?:accounting|accountants?|cpas?)\b", Some("accounting"), FINANCE),
    (BusinessType, r"\brealt(?:y|ors?)\b", Some("realty"), REAL_ESTATE),
    (BusinessType, r"\bproperty\s+management\b", Some("property management"), REAL_ESTATE),
    (BusinessType, r"\bhotels?\b", Some("hotel"), LODGING),
    (BusinessType, r"\bmotels?\b", Some("motel"), LODGING),
    (BusinessType, r"\bresorts?\b", Some("resort"), LODGING),
    (BusinessType, r"\binn\b", Some("inn"), LODGING),
    (BusinessType, r"\bhostels?\b", Some("hostel"), LODGING),
    (BusinessType, r"\bbed\s+(?:and|&)\s+breakfast\b", Some("bed and breakfast"), LODGING),
    (BusinessType, r"\bgyms?\b", Some("gym"), FITNESS),
    (BusinessType, r"\bfitness\b", Some("fitness"), FITNESS),
    (BusinessType, r"\byoga\b", Some("yoga"), FITNESS),
    (BusinessType, r"\bpilates\b", Some("pilates"), FITNESS),
    (BusinessType, r"\bcrossfit\b", Some("crossfit"), FITNESS),
    (BusinessType, r"\bsalons?\b", Some("salon"), BEAUTY),
    (BusinessType, r"\bbarber(?:s|shops?)?\b", Some("barber"), BEAUTY),
    (BusinessType, r"\bspas?\b", Some("spa"), BEAUTY),
    (BusinessType, r"\bschools?\b", Some("school"), EDUCATION),
    (BusinessType, r"\bacadem(?:y|ies)\b", Some("academy"), EDUCATION),
    (BusinessType, r"\b(?:universit(?:y|ies)|colleges?)\b", Some("university"), EDUCATION),
    (BusinessType, r"\b(?:preschools?|daycares?)\b", Some("preschool"), EDUCATION),
    (BusinessType, r"\b(?:inc|llc|ltd|corp|corporation|company|co)\b\.?", Some("corporation"), None),
    (BusinessType, r"\b(?:holdings|enterprises|ventures)\b", Some("holding company"), None),
    // Products
    (Product, r"\bpizzas?\b", Some("pizza"), RESTAURANTS),
    (Product, r"\b(?:ham)?burgers?\b", Some("burger"), RESTAURANTS),
    (Product, r"\bsushi\b", Some("sushi"), RESTAURANTS),
    (Product, r"\b(?:tacos?|taquerias?)\b", Some("taco"), RESTAURANTS),
    (Product, r"\bsteaks?\b", Some("steak"), RESTAURANTS),
    (Product, r"\bpasta\b", Some("pasta"), RESTAURANTS),
    (Product, r"\b(?:bbq|barbecue)\b", Some("bbq"), RESTAURANTS),
    (Product, r"\bcoffees?\b", Some("coffee"), COFFEE),
    (Product, r"\bespressos?\b", Some("espresso"), COFFEE),
    (Product, r"\blattes?\b", Some("latte"), COFFEE),
    (Product, r"\b(?:teas?|tea\s*house)\b", Some("tea"), COFFEE),
    (Product, r"\b(?:breads?|pastr(?:y|ies))\b", Some("bread"), GROCERY),
    (Product, r"\bproduce\b", Some("produce"), GROCERY),
    (Product, r"\b(?:cloth(?:ing|es)|apparel)\b", Some("clothing"), RETAIL),
    (Product, r"\b(?:shoes?|footwear)\b", Some("shoe"), RETAIL),
    (Product, r"\bfurniture\b", Some("furniture"), RETAIL),
    (Product, r"\bjewel(?:le)?ry\b", Some("jewelry"), RETAIL),
    (Product, r"\bsoftware\b", Some("software"), TECH),
    (Product, r"\bsaas\b", Some("saas"), TECH),
    (Product, r"\bmobile\s+apps?\b", Some("mobile app"), TECH),
    (Product, r"\bprescriptions?\b", Some("prescription"), HEALTH),
    (Product, r"\btires?\b", Some("tire"), AUTO),
    (Product, r"\bcosmetics?\b", Some("cosmetic"), BEAUTY),
    // Services
    (Service, r"\bcater(?:ing|ers?)\b", Some("catering"), RESTAURANTS),
    (Service, r"\b(?:take\s*out|delivery)\b", Some("takeout"), RESTAURANTS),
    (Service, r"\bweb\s+(?:development|design)\b", Some("web development"), TECH),
    (Service, r"\bit\s+(?:services|consulting|support)\b", Some("it service"), TECH),
    (Service, r"\bcyber\s*security\b", Some("cybersecurity"), TECH),
    (Service, r"\banalytics\b", Some("analytics"), TECH),
    (Service, r"\bcloud\b", Some("cloud"), TECH),
    (Service, r"\b(?:teeth|orthodont\w*)\b", Some("teeth"), HEALTH),
    (Service, r"\blitigation\b", Some("litigation"), LEGAL),
    (Service, r"\bestate\s+planning\b", Some("estate planning"), LEGAL),
    (Service, r"\brenovat(?:ion|ions|ing)\b", Some("renovation"), CONSTRUCTION),
    (Service, r"\bremodel(?:ing|ers?)?\b", Some("remodeling"), CONSTRUCTION),
    (Service, r"\bconcrete\b", Some("concrete"), CONSTRUCTION),
    (Service, r"\boil\s+changes?\b", Some("oil change"), AUTO),
    (Service, r"\bbrakes?\b", Some("brake"), AUTO),
    (Service, r"\btax(?:es)?\b", Some("tax"), FINANCE),
    (Service, r"\b(?:loans?|lending)\b", Some("loan"), FINANCE),
    (Service, r"\bmortgages?\b", Some("mortgage"), FINANCE),
    (Service, r"\binsurance\b", Some("insurance"), FINANCE),
    (Service, r"\bapartments?\b", Some("apartment"), REAL_ESTATE),
    (Service, r"\bhomes?\s+for\s+sale\b", Some("homes for sale"), REAL_ESTATE),
    (Service, r"\bguest\s+rooms?\b", Some("guest room"), LODGING),
    (Service, r"\bpersonal\s+train(?:ing|ers?)\b", Some("personal training"), FITNESS),
    (Service, r"\bhaircuts?\b", Some("haircut"), BEAUTY),
    (Service, r"\bmassages?\b", Some("massage"), BEAUTY),
    (Service, r"\b(?:manicures?|pedicures?|nails?)\b", Some("nail"), BEAUTY),
    (Service, r"\btutor(?:ing|s)?\b", Some("tutoring"), EDUCATION),
    (Service, r"\bconsult(?:ing|ants?|ancy)\b", Some("consulting"), None),
    // Industry indicators
    (IndustryIndicator, r"\bfood\s+service\b", Some("food service"), RESTAURANTS),
    (IndustryIndicator, r"\b(?:dining|cuisine)\b", Some("dining"), RESTAURANTS),
    (IndustryIndicator, r"\bhospitality\b", Some("hospitality"), LODGING),
    (IndustryIndicator, r"\b(?:lodging|accommodations?)\b", Some("lodging"), LODGING),
    (IndustryIndicator, r"\b(?:health\s*care|medical)\b", Some("healthcare"), HEALTH),
    (IndustryIndicator, r"\b(?:technolog(?:y|ies)|tech)\b", Some("technology"), TECH),
    (IndustryIndicator, r"\bfinanc(?:e|ial)\b", Some("finance"), FINANCE),
    (IndustryIndicator, r"\blegal\b", Some("legal"), LEGAL),
    (IndustryIndicator, r"\bautomotive\b", Some("automotive"), AUTO),
    (IndustryIndicator, r"\bconstruction\b", Some("construction"), CONSTRUCTION),
    (IndustryIndicator, r"\bretail(?:ers?)?\b", Some("retail"), RETAIL),
    (IndustryIndicator, r"\breal\s+estate\b", Some("real estate"), REAL_ESTATE),
    (IndustryIndicator, r"\bwellness\b", Some("wellness"), FITNESS),
    (IndustryIndicator, r"\bbeauty\b", Some("beauty"), BEAUTY),
    (IndustryIndicator, r"\beducation(?:al)?\b", Some("education"), EDUCATION),
    // Locations
    (
        Location,
        r"\b\d+\s+[a-z]+(?:\s+[a-z]+)?\s+(?:st|street|ave|avenue|rd|road|blvd|boulevard|ln|lane|dr|drive)\b",
        Some("street address"),
        None,
    ),
    (Location, r"\bdowntown\b", Some("downtown"), None),
    (Location, r"\bmain\s+st(?:reet)?\b", Some("main street"), None),
    (Location, r"\bneighbou?rhood\b", Some("neighborhood"), None),
    (
        Location,
        r"\b(?:new york|los angeles|chicago|houston|phoenix|san francisco|seattle|boston|miami|austin|denver|portland|atlanta)\b",
        None,
        None,
    ),
    // Brands
    (Brand, r"\bstarbucks\b", Some("starbucks"), COFFEE),
    (Brand, r"\bdunkin'?\b", Some("dunkin"), COFFEE),
    (Brand, r"\bpeet'?s\b", Some("peets"), COFFEE),
    (Brand, r"\bmcdonald'?s\b", Some("mcdonalds"), RESTAURANTS),
    (Brand, r"\bdomino'?s\b", Some("dominos"), RESTAURANTS),
    (Brand, r"\bchipotle\b", Some("chipotle"), RESTAURANTS),
    (Brand, r"\bwalmart\b", Some("walmart"), RETAIL),
    (Brand, r"\bcostco\b", Some("costco"), RETAIL),
    (Brand, r"\bkroger\b", Some("kroger"), GROCERY),
    (Brand, r"\bsafeway\b", Some("safeway"), GROCERY),
    (Brand, r"\bwhole\s+foods\b", Some("whole foods"), GROCERY),
    (Brand, r"\bmarriott\b", Some("marriott"), LODGING),
    (Brand, r"\bhilton\b", Some("hilton"), LODGING),
    (Brand, r"\bhyatt\b", Some("hyatt"), LODGING),
    (Brand, r"\bplanet\s+fitness\b", Some("planet fitness"), FITNESS),
    (Brand, r"\bjiffy\s+lube\b", Some("jiffy lube"), AUTO),
    (Brand, r"\bh\s*&\s*r\s+block\b", Some("h&r block"), FINANCE),
    (Brand, r"\b(?:microsoft|oracle|salesforce)\b", None, TECH),
    (Brand, r"\b(?:walgreens|cvs)\b", None, HEALTH),
];
