//! # Normalization Tables Module
//!
//! Static tables and the decorative-symbol pattern used to canonicalize
//! ingredient names and units. Category keywords and unit synonyms follow a
//! single canonical table; older divergent variants are not carried.

use lazy_static::lazy_static;
use regex::Regex;

// Decorative pictographs used for flavor in authored recipe names, plus the
// emoji presentation selector that trails some of them.
pub const DECORATIVE_SYMBOLS_PATTERN: &str = "[🥔🍆🥦🥬🥕🧄🧅🌶🍅🥒🥑🍌🍎🍊🍋🍇🍓🍑🥭🍍🥝🍒🍈🍉🍐🍏🦐🥩🍝🍵🍹🧋🍨🥚🍞🍟🍠🍄\u{FE0F}]";

lazy_static! {
    pub static ref DECORATIVE_SYMBOLS_REGEX: Regex = Regex::new(DECORATIVE_SYMBOLS_PATTERN)
        .expect("Decorative symbol pattern should be valid");
}

/// Synonymous spellings, looked up after symbol stripping and trimming
pub const NAME_ALIASES: &[(&str, &str)] = &[
    ("纯牛奶", "牛奶"),
    ("牛奶🥛", "牛奶"),
    ("纯牛奶🥛", "牛奶"),
];

/// Unit synonyms; unmapped units pass through unchanged
pub const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("克", "g"),
    ("g", "g"),
    ("毫升", "ml"),
    ("ml", "ml"),
];

/// Volumetric units treated as numerically equal to a mass unit for one
/// ingredient: (canonical name, volume unit, mass unit). The 1:1 factor is
/// an approximation, not a measured density.
pub const DENSITY_RULES: &[(&str, &str, &str)] = &[("牛奶", "ml", "g")];

/// Category used when no keyword matches
pub const OTHER_CATEGORY: &str = "其他";

/// Category keyword table. Order matters: the first matching category wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "蔬菜",
        &[
            "白菜", "青菜", "菠菜", "生菜", "韭菜", "芹菜", "香菜", "小葱", "大葱", "青葱", "香葱",
            "洋葱", "红洋葱", "蒜", "姜", "蒜末", "姜片", "葱段", "葱花", "蒜蓉", "蒜酥", "胡萝卜",
            "白萝卜", "土豆", "小土豆", "红薯", "紫薯", "莲藕", "藕", "茄子", "西红柿", "番茄",
            "黄瓜", "青椒", "红椒", "彩椒", "小米辣", "辣椒", "辣椒粉", "西蓝花", "西兰花", "花菜",
            "菜花", "蘑菇", "香菇", "泡发干香菇", "金针菇", "平菇", "杏鲍菇", "豆芽", "绿豆芽",
            "黄豆芽", "豆腐", "豆干", "腐竹", "紫菜", "海带", "木耳", "银耳", "羽衣甘蓝",
            "小卷心菜",
        ],
    ),
    (
        "水果",
        &[
            "苹果", "梨", "香蕉", "橙子", "橘子", "柠檬", "柠檬汁", "葡萄", "草莓", "蓝莓", "樱桃",
            "桃子", "杏子", "李子", "芒果", "菠萝", "新鲜菠萝", "西瓜", "哈密瓜", "火龙果",
            "猕猴桃", "柚子", "石榴", "荔枝", "龙眼", "榴莲", "椰子",
        ],
    ),
    (
        "肉类",
        &[
            "猪肉", "猪肉糜", "猪梅肉", "前臀尖", "排骨", "牛肉", "牛里脊", "牛腱子", "金钱腱",
            "羊肉", "鸡肉", "鸡胸肉", "鸡腿", "鸡翅", "鸭肉", "鹅肉", "火腿", "培根", "香肠",
            "腊肉", "腌肉", "肉沫", "肉末", "肉丝", "肉片",
        ],
    ),
    (
        "海鲜",
        &[
            "鱼", "草鱼", "鲫鱼", "鲤鱼", "带鱼", "黄花鱼", "三文鱼", "虾", "基围虾", "大虾", "对虾",
            "明虾", "虾仁", "螃蟹", "蟹", "花甲", "蛤蜊", "扇贝", "生蚝", "鲍鱼", "海参", "鱿鱼",
            "墨鱼", "章鱼", "海蜇", "海带", "紫菜",
        ],
    ),
    (
        "蛋奶",
        &[
            "鸡蛋", "鸭蛋", "鹅蛋", "鹌鹑蛋", "蛋黄", "蛋白", "牛奶", "纯牛奶", "酸奶", "淡奶油",
            "奶油", "奶油奶酪", "奶酪", "芝士", "黄油", "猪油", "炼乳", "咖啡伴侣", "厚乳",
        ],
    ),
    (
        "主食",
        &[
            "大米", "米饭", "燕麦米", "红糙米", "黑糯米", "糯米", "小米", "面条", "面饼", "挂面",
            "河粉", "鲜河粉", "米粉", "粉丝", "粉条", "饺子", "包子", "馒头", "面包", "吐司", "玉米",
            "玉米淀粉", "淀粉", "干淀粉", "面粉", "高筋面粉", "低筋面粉", "木薯粉",
        ],
    ),
    (
        "调味品",
        &[
            "盐", "糖", "白砂糖", "冰糖", "红糖", "黑糖", "糖浆", "酱油", "生抽", "老抽", "味极鲜",
            "耗油", "蚝油", "料酒", "黄酒", "白米醋", "香醋", "陈醋", "白醋", "番茄酱", "豆瓣酱",
            "甜面酱", "黄豆酱", "芝麻酱", "花生酱", "辣椒酱", "蒜蓉酱", "十三香", "五香粉",
            "胡椒粉", "白胡椒粉", "黑胡椒粉", "孜然粉", "花椒", "花椒粒", "八角", "桂皮", "香叶",
            "草果", "干辣椒", "小苏打", "鸡精", "味精", "鸡粉", "话梅", "玫瑰", "绿茶", "红茶",
            "茶叶", "茶汤",
        ],
    ),
    (
        "食用油",
        &[
            "食用油", "花生油", "菜籽油", "玉米油", "大豆油", "葵花籽油", "橄榄油", "芝麻油",
            "香油", "麻油", "色拉油",
        ],
    ),
    (
        OTHER_CATEGORY,
        &[
            "水", "清水", "纯净水", "热水", "开水", "冰块", "小苏打", "泡打粉", "酵母", "可可粉",
            "巧克力", "黑巧克力", "红枣", "枸杞", "莲子", "百合", "银耳", "燕窝", "蜂蜜", "蜂王浆",
        ],
    ),
];
