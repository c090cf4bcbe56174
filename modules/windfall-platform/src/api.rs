//! Endpoint table. Grouped by host; the mirror at the bottom is only ever
//! reached as a last-resort failover line.

pub const SPACE_MYINFO: &str = "https://api.bilibili.com/x/space/myinfo";
pub const NAV_STAT: &str = "https://api.bilibili.com/x/web-interface/nav/stat";

pub const MSGFEED_UNREAD: &str = "https://api.bilibili.com/x/msgfeed/unread";
pub const MSGFEED_AT: &str = "https://api.bilibili.com/x/msgfeed/at";
pub const MSGFEED_REPLY: &str = "https://api.bilibili.com/x/msgfeed/reply";

pub const POLYMER_DYNAMIC_DETAIL: &str =
    "https://api.bilibili.com/x/polymer/web-dynamic/v1/detail";
pub const DYNAMIC_SVR_DETAIL: &str =
    "https://api.vc.bilibili.com/dynamic_svr/v1/dynamic_svr/get_dynamic_detail";

pub const WEB_INTERFACE_CARD: &str = "https://api.bilibili.com/x/web-interface/card";
pub const RELATION_STAT: &str = "https://api.bilibili.com/x/relation/stat";
pub const FOLLOWER_MIRROR: &str = "https://tenapi.cn/bilibilifo/";

pub const RELATION_MODIFY: &str = "https://api.bilibili.com/x/relation/modify";
pub const FEED_SET_USER_FOLLOW: &str = "https://api.vc.bilibili.com/feed/v1/feed/SetUserFollow";
pub const RELATION_BATCH_MODIFY: &str = "https://api.bilibili.com/x/relation/batch/modify";
pub const ATTENTION_LIST: &str = "https://api.vc.bilibili.com/feed/v1/feed/get_attention_list";

pub const RELATION_TAGS: &str = "https://api.bilibili.com/x/relation/tags";
pub const RELATION_TAG_CREATE: &str = "https://api.bilibili.com/x/relation/tag/create";
pub const RELATION_TAGS_ADD_USERS: &str = "https://api.bilibili.com/x/relation/tags/addUsers";

pub const LOTTERY_NOTICE: &str =
    "https://api.vc.bilibili.com/lottery_svr/v1/lottery_svr/lottery_notice";
pub const RESERVE_ATTACH_CARD_BUTTON: &str =
    "https://api.vc.bilibili.com/dynamic_mix/v1/dynamic_mix/reserve_attach_card_button";

pub const DYNAMIC_LIKE_THUMB: &str =
    "https://api.vc.bilibili.com/dynamic_like/v1/dynamic_like/thumb";
pub const DYNAMIC_REPOST: &str =
    "https://api.vc.bilibili.com/dynamic_repost/v1/dynamic_repost/repost";
pub const DYNAMIC_SHARE: &str =
    "https://api.vc.bilibili.com/dynamic_repost/v1/dynamic_repost/share";

pub const REPLY_ADD: &str = "https://api.bilibili.com/x/v2/reply/add";
pub const REPLY_LIST: &str = "https://api.bilibili.com/x/v2/reply";

pub const POLYMER_FEED_SPACE: &str =
    "https://api.bilibili.com/x/polymer/web-dynamic/v1/feed/space";
pub const TOPIC_HISTORY: &str =
    "https://api.vc.bilibili.com/topic_svr/v1/topic_svr/topic_history";
pub const SEARCH_TYPE: &str = "https://api.bilibili.com/x/web-interface/search/type";
pub const ARTICLE_VIEW: &str = "https://www.bilibili.com/read/cv";

pub const TOP_RCMD: &str = "https://api.bilibili.com/x/web-interface/index/top/rcmd";
pub const TOP_FEED_RCMD: &str = "https://api.bilibili.com/x/web-interface/index/top/feed/rcmd";
